//! Single-block rendering.
//!
//! [`render_block`] turns one [`ContentBlock`] into at most one [`RenderNode`].
//! It never groups list items; that happens one level up in
//! [`crate::grouping`], which also supplies ordinals for numbered items.

use crate::assets::AssetMap;
use crate::grouping::render_blocks;
use crate::highlight;
use crate::media;
use crate::model::{BlockKind, ContentBlock, RichTextSpan, plain_text};
use crate::node::RenderNode;
use crate::richtext::{EmphasisMode, InlineNode, format_spans};

/// Alt text used when an image has no caption.
pub const DEFAULT_IMAGE_ALT: &str = "Content image";

/// Everything a render pass reads. Immutable, so documents can be rendered in
/// parallel against one asset map.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub assets: &'a AssetMap,
    pub emphasis: EmphasisMode,
}

impl<'a> RenderContext<'a> {
    pub fn new(assets: &'a AssetMap) -> Self {
        Self {
            assets,
            emphasis: EmphasisMode::default(),
        }
    }

    pub fn with_emphasis(mut self, emphasis: EmphasisMode) -> Self {
        self.emphasis = emphasis;
        self
    }

    fn inline(&self, spans: &[RichTextSpan]) -> Vec<InlineNode> {
        format_spans(spans, self.emphasis)
    }
}

/// Render one block. `ordinal` is the item's position within a numbered run.
///
/// Returns `None` for blocks that produce no output: unsupported or
/// undecodable blocks, and table rows found outside a table.
pub fn render_block(
    block: &ContentBlock,
    ordinal: Option<usize>,
    ctx: &RenderContext<'_>,
) -> Option<RenderNode> {
    let node = match &block.kind {
        BlockKind::Paragraph { text } => RenderNode::Paragraph {
            content: ctx.inline(text),
            children: render_blocks(&block.children, ctx),
        },
        BlockKind::Heading { level, text } => RenderNode::Heading {
            level: (*level).clamp(1, 3),
            anchor: block.id.clone(),
            content: ctx.inline(text),
        },
        BlockKind::BulletedListItem { text } => RenderNode::ListItem {
            ordinal: None,
            content: ctx.inline(text),
            children: render_blocks(&block.children, ctx),
        },
        BlockKind::NumberedListItem { text } => RenderNode::ListItem {
            ordinal,
            content: ctx.inline(text),
            children: render_blocks(&block.children, ctx),
        },
        BlockKind::Quote { text } => RenderNode::Quote {
            content: ctx.inline(text),
            children: render_blocks(&block.children, ctx),
        },
        BlockKind::Callout { text, icon, color } => RenderNode::Callout {
            icon: icon.clone(),
            color: color.clone(),
            content: ctx.inline(text),
            children: render_blocks(&block.children, ctx),
        },
        BlockKind::Code {
            text,
            language,
            caption,
        } => {
            let source = plain_text(text);
            let highlighted = highlight::highlight(language, &source);
            RenderNode::Code {
                language: language.clone(),
                source,
                highlighted,
                caption: ctx.inline(caption),
            }
        }
        BlockKind::Image { source, caption } => {
            let src = source.as_ref().map(|s| ctx.assets.resolve(s.url()));
            if src.is_none() {
                tracing::debug!(block_id = %block.id, "image block without URL, rendering placeholder");
            }
            let alt = plain_text(caption);
            RenderNode::Image {
                src,
                alt: if alt.is_empty() {
                    DEFAULT_IMAGE_ALT.to_string()
                } else {
                    alt
                },
                caption: ctx.inline(caption),
            }
        }
        BlockKind::Video { source, caption } => RenderNode::Media {
            embed: media::classify_video(source),
            caption: ctx.inline(caption),
        },
        BlockKind::Embed { url, caption } => RenderNode::Media {
            embed: media::classify_embed(url),
            caption: ctx.inline(caption),
        },
        BlockKind::Bookmark { url, caption } => RenderNode::Media {
            embed: media::classify_bookmark(url),
            caption: ctx.inline(caption),
        },
        BlockKind::Divider => RenderNode::Divider,
        BlockKind::Table {
            width,
            has_column_header,
            has_row_header,
        } => RenderNode::Table {
            has_column_header: *has_column_header,
            has_row_header: *has_row_header,
            rows: table_rows(block, *width, ctx),
        },
        BlockKind::TableRow { .. } => {
            tracing::debug!(block_id = %block.id, "table row outside a table, dropping");
            return None;
        }
        BlockKind::Unsupported { type_name, reason } => {
            tracing::debug!(block_id = %block.id, %type_name, %reason, "skipping block");
            return None;
        }
    };
    Some(node)
}

/// Rows of a table block, every row normalized to the declared width.
///
/// A width of zero (missing from the payload) falls back to the widest row.
fn table_rows(
    table: &ContentBlock,
    width: usize,
    ctx: &RenderContext<'_>,
) -> Vec<Vec<Vec<InlineNode>>> {
    let rows: Vec<&Vec<Vec<RichTextSpan>>> = table
        .children
        .iter()
        .filter_map(|child| match &child.kind {
            BlockKind::TableRow { cells } => Some(cells),
            _ => {
                tracing::debug!(
                    block_id = %child.id,
                    type_name = child.type_name(),
                    "non-row child inside table, dropping"
                );
                None
            }
        })
        .collect();

    let width = if width > 0 {
        width
    } else {
        rows.iter().map(|r| r.len()).max().unwrap_or(0)
    };

    rows.into_iter()
        .map(|cells| {
            let mut row: Vec<Vec<InlineNode>> =
                cells.iter().take(width).map(|cell| ctx.inline(cell)).collect();
            row.resize_with(width, Vec::new);
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileSource;

    fn para(id: &str, text: &str) -> ContentBlock {
        ContentBlock::new(
            id,
            BlockKind::Paragraph {
                text: vec![RichTextSpan::plain(text)],
            },
        )
    }

    #[test]
    fn test_heading_anchor_is_block_id() {
        let map = AssetMap::default();
        let ctx = RenderContext::new(&map);
        let block = ContentBlock::new(
            "h-123",
            BlockKind::Heading {
                level: 2,
                text: vec![RichTextSpan::plain("Intro")],
            },
        );
        match render_block(&block, None, &ctx) {
            Some(RenderNode::Heading { level, anchor, .. }) => {
                assert_eq!(level, 2);
                assert_eq!(anchor, "h-123");
            }
            other => panic!("expected heading, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_and_stray_rows_render_nothing() {
        let map = AssetMap::default();
        let ctx = RenderContext::new(&map);
        let unsupported = ContentBlock::new(
            "u",
            BlockKind::Unsupported {
                type_name: "toggle".into(),
                reason: "unsupported block type".into(),
            },
        );
        let row = ContentBlock::new("r", BlockKind::TableRow { cells: vec![] });
        assert_eq!(render_block(&unsupported, None, &ctx), None);
        assert_eq!(render_block(&row, None, &ctx), None);
    }

    #[test]
    fn test_image_resolves_through_map() {
        let mut map = AssetMap::default();
        map.insert("https://cdn.example.com/a.png", "/images/notion/abc.png");
        let ctx = RenderContext::new(&map);

        let block = ContentBlock::new(
            "i",
            BlockKind::Image {
                source: Some(FileSource::External("https://cdn.example.com/a.png".into())),
                caption: vec![],
            },
        );
        assert_eq!(
            render_block(&block, None, &ctx),
            Some(RenderNode::Image {
                src: Some("/images/notion/abc.png".into()),
                alt: DEFAULT_IMAGE_ALT.into(),
                caption: vec![],
            })
        );
    }

    #[test]
    fn test_image_without_url_keeps_caption() {
        let map = AssetMap::default();
        let ctx = RenderContext::new(&map);
        let block = ContentBlock::new(
            "i",
            BlockKind::Image {
                source: None,
                caption: vec![RichTextSpan::plain("diagram")],
            },
        );
        assert_eq!(
            render_block(&block, None, &ctx),
            Some(RenderNode::Image {
                src: None,
                alt: "diagram".into(),
                caption: vec![InlineNode::plain("diagram")],
            })
        );
    }

    #[test]
    fn test_table_rows_normalized_to_width() {
        let map = AssetMap::default();
        let ctx = RenderContext::new(&map);
        let cell = |t: &str| vec![RichTextSpan::plain(t)];
        let table = ContentBlock::new(
            "t",
            BlockKind::Table {
                width: 3,
                has_column_header: true,
                has_row_header: false,
            },
        )
        .with_children(vec![
            ContentBlock::new(
                "r1",
                BlockKind::TableRow {
                    cells: vec![cell("a"), cell("b"), cell("c")],
                },
            ),
            ContentBlock::new(
                "r2",
                BlockKind::TableRow {
                    cells: vec![cell("d")],
                },
            ),
            para("stray", "ignored"),
        ]);

        let Some(RenderNode::Table { rows, .. }) = render_block(&table, None, &ctx) else {
            panic!("expected table");
        };
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() == 3));
        assert_eq!(rows[1][0], vec![InlineNode::plain("d")]);
        assert!(rows[1][1].is_empty() && rows[1][2].is_empty());
    }

    #[test]
    fn test_code_unsupported_language_is_plain() {
        let map = AssetMap::default();
        let ctx = RenderContext::new(&map);
        let block = ContentBlock::new(
            "c",
            BlockKind::Code {
                text: vec![RichTextSpan::plain("x <- 1")],
                language: "r".into(),
                caption: vec![],
            },
        );
        match render_block(&block, None, &ctx) {
            Some(RenderNode::Code {
                source,
                highlighted,
                ..
            }) => {
                assert_eq!(source, "x <- 1");
                assert_eq!(highlighted, None);
            }
            other => panic!("expected code, got {other:?}"),
        }
    }

    #[test]
    fn test_callout_renders_children() {
        let map = AssetMap::default();
        let ctx = RenderContext::new(&map);
        let callout = ContentBlock::new(
            "c",
            BlockKind::Callout {
                text: vec![RichTextSpan::plain("Note")],
                icon: Some("💡".into()),
                color: None,
            },
        )
        .with_children(vec![para("p", "inside")]);

        let node = render_block(&callout, None, &ctx).unwrap();
        assert_eq!(node.children().len(), 1);
    }
}
