use serde::Serialize;
use smol_str::SmolStr;

use crate::media::MediaEmbed;
use crate::richtext::InlineNode;

/// One rendered block. Containers own their rendered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum RenderNode {
    Paragraph {
        content: Vec<InlineNode>,
        children: Vec<RenderNode>,
    },
    Heading {
        level: u8,
        /// Always the source block id.
        anchor: String,
        content: Vec<InlineNode>,
    },
    BulletedList {
        items: Vec<RenderNode>,
    },
    NumberedList {
        items: Vec<RenderNode>,
    },
    /// `ordinal` is set only inside a numbered list.
    ListItem {
        ordinal: Option<usize>,
        content: Vec<InlineNode>,
        children: Vec<RenderNode>,
    },
    Quote {
        content: Vec<InlineNode>,
        children: Vec<RenderNode>,
    },
    Callout {
        icon: Option<String>,
        color: Option<SmolStr>,
        content: Vec<InlineNode>,
        children: Vec<RenderNode>,
    },
    Code {
        language: SmolStr,
        source: String,
        /// Highlighted markup, when the language is supported.
        highlighted: Option<String>,
        caption: Vec<InlineNode>,
    },
    /// `src: None` renders as a placeholder.
    Image {
        src: Option<String>,
        alt: String,
        caption: Vec<InlineNode>,
    },
    Media {
        embed: MediaEmbed,
        caption: Vec<InlineNode>,
    },
    Divider,
    Table {
        has_column_header: bool,
        has_row_header: bool,
        rows: Vec<Vec<Vec<InlineNode>>>,
    },
}

impl RenderNode {
    /// Rendered children, for nodes that contain other nodes.
    pub fn children(&self) -> &[RenderNode] {
        match self {
            RenderNode::Paragraph { children, .. }
            | RenderNode::ListItem { children, .. }
            | RenderNode::Quote { children, .. }
            | RenderNode::Callout { children, .. } => children,
            RenderNode::BulletedList { items } | RenderNode::NumberedList { items } => items,
            _ => &[],
        }
    }
}
