//! List grouping over sibling sequences.
//!
//! Adjacent bulleted items collapse into one unordered container and adjacent
//! numbered items into one ordered container numbered from 1. Every sibling
//! list is grouped on its own; nesting never joins runs across levels.

use crate::blocks::{RenderContext, render_block};
use crate::model::{BlockKind, ContentBlock};
use crate::node::RenderNode;

#[derive(Debug, Clone, PartialEq)]
pub enum Group<'a> {
    Bulleted(Vec<&'a ContentBlock>),
    Numbered(Vec<&'a ContentBlock>),
    Single(&'a ContentBlock),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    None,
    InBulletRun,
    InNumberRun,
}

fn run_kind(block: &ContentBlock) -> RunState {
    match block.kind {
        BlockKind::BulletedListItem { .. } => RunState::InBulletRun,
        BlockKind::NumberedListItem { .. } => RunState::InNumberRun,
        _ => RunState::None,
    }
}

/// Group one sibling list in a single pass.
pub fn group_siblings(blocks: &[ContentBlock]) -> Vec<Group<'_>> {
    let mut groups = Vec::new();
    let mut state = RunState::None;
    let mut run: Vec<&ContentBlock> = Vec::new();

    fn close<'a>(state: RunState, run: &mut Vec<&'a ContentBlock>, groups: &mut Vec<Group<'a>>) {
        if run.is_empty() {
            return;
        }
        let items = std::mem::take(run);
        match state {
            RunState::InBulletRun => groups.push(Group::Bulleted(items)),
            RunState::InNumberRun => groups.push(Group::Numbered(items)),
            RunState::None => groups.extend(items.into_iter().map(Group::Single)),
        }
    }

    for block in blocks {
        let kind = run_kind(block);
        if kind != state {
            close(state, &mut run, &mut groups);
            state = kind;
        }
        match kind {
            RunState::None => groups.push(Group::Single(block)),
            _ => run.push(block),
        }
    }
    close(state, &mut run, &mut groups);

    groups
}

/// Render a sibling list, grouping list runs and recursing into children.
pub fn render_blocks(blocks: &[ContentBlock], ctx: &RenderContext<'_>) -> Vec<RenderNode> {
    group_siblings(blocks)
        .into_iter()
        .filter_map(|group| match group {
            Group::Single(block) => render_block(block, None, ctx),
            Group::Bulleted(items) => Some(RenderNode::BulletedList {
                items: items
                    .into_iter()
                    .filter_map(|item| render_block(item, None, ctx))
                    .collect(),
            }),
            Group::Numbered(items) => Some(RenderNode::NumberedList {
                items: items
                    .into_iter()
                    .enumerate()
                    .filter_map(|(i, item)| render_block(item, Some(i + 1), ctx))
                    .collect(),
            }),
        })
        .collect()
}
