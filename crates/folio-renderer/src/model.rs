//! Typed content blocks decoded from the source's JSON.
//!
//! Decoding never fails as a whole. A block whose type tag is unknown, or whose
//! payload does not have the shape its tag promises, becomes
//! [`BlockKind::Unsupported`] and renders nothing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

/// Inline annotation flags carried by a rich-text span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: SmolStr,
}

impl Annotations {
    /// The color name, unless it is the source's "default" (or absent).
    pub fn color_token(&self) -> Option<&str> {
        match self.color.as_str() {
            "" | "default" => None,
            color => Some(color),
        }
    }
}

/// A run of text with a single annotation set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSpan")]
pub struct RichTextSpan {
    pub text: String,
    pub annotations: Annotations,
    pub href: Option<String>,
}

impl RichTextSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.annotations.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.annotations.italic = true;
        self
    }

    pub fn strikethrough(mut self) -> Self {
        self.annotations.strikethrough = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.annotations.underline = true;
        self
    }

    pub fn code(mut self) -> Self {
        self.annotations.code = true;
        self
    }

    pub fn color(mut self, color: &str) -> Self {
        self.annotations.color = SmolStr::new(color);
        self
    }

    pub fn link(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }
}

#[derive(Deserialize)]
struct RawSpan {
    #[serde(default)]
    plain_text: Option<String>,
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    text: Option<RawText>,
    #[serde(default)]
    annotations: Annotations,
}

#[derive(Deserialize)]
struct RawText {
    #[serde(default)]
    content: String,
    #[serde(default)]
    link: Option<RawLink>,
}

#[derive(Deserialize)]
struct RawLink {
    url: String,
}

impl From<RawSpan> for RichTextSpan {
    fn from(raw: RawSpan) -> Self {
        let (content, link) = match raw.text {
            Some(t) => (Some(t.content), t.link.map(|l| l.url)),
            None => (None, None),
        };
        Self {
            text: raw.plain_text.or(content).unwrap_or_default(),
            annotations: raw.annotations,
            href: raw.href.or(link),
        }
    }
}

/// Concatenated text of a span list, annotations dropped.
pub fn plain_text(spans: &[RichTextSpan]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

/// Where a file-backed block's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// A link the author pasted in.
    External(String),
    /// Uploaded to the source; the URL is signed and expires.
    Hosted(String),
}

impl FileSource {
    pub fn url(&self) -> &str {
        match self {
            FileSource::External(url) | FileSource::Hosted(url) => url,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph {
        text: Vec<RichTextSpan>,
    },
    Heading {
        level: u8,
        text: Vec<RichTextSpan>,
    },
    BulletedListItem {
        text: Vec<RichTextSpan>,
    },
    NumberedListItem {
        text: Vec<RichTextSpan>,
    },
    Quote {
        text: Vec<RichTextSpan>,
    },
    Callout {
        text: Vec<RichTextSpan>,
        icon: Option<String>,
        color: Option<SmolStr>,
    },
    Code {
        text: Vec<RichTextSpan>,
        language: SmolStr,
        caption: Vec<RichTextSpan>,
    },
    /// `source` is `None` when the payload carried no usable URL.
    Image {
        source: Option<FileSource>,
        caption: Vec<RichTextSpan>,
    },
    Video {
        source: FileSource,
        caption: Vec<RichTextSpan>,
    },
    Embed {
        url: String,
        caption: Vec<RichTextSpan>,
    },
    Bookmark {
        url: String,
        caption: Vec<RichTextSpan>,
    },
    Divider,
    /// Rows are the block's `TableRow` children.
    Table {
        width: usize,
        has_column_header: bool,
        has_row_header: bool,
    },
    TableRow {
        cells: Vec<Vec<RichTextSpan>>,
    },
    Unsupported {
        type_name: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentBlock {
    pub id: String,
    pub kind: BlockKind,
    pub children: Vec<ContentBlock>,
}

impl ContentBlock {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<ContentBlock>) -> Self {
        self.children = children;
        self
    }

    /// The source's type tag for this block.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            BlockKind::Paragraph { .. } => "paragraph",
            BlockKind::Heading { level: 1, .. } => "heading_1",
            BlockKind::Heading { level: 2, .. } => "heading_2",
            BlockKind::Heading { .. } => "heading_3",
            BlockKind::BulletedListItem { .. } => "bulleted_list_item",
            BlockKind::NumberedListItem { .. } => "numbered_list_item",
            BlockKind::Quote { .. } => "quote",
            BlockKind::Callout { .. } => "callout",
            BlockKind::Code { .. } => "code",
            BlockKind::Image { .. } => "image",
            BlockKind::Video { .. } => "video",
            BlockKind::Embed { .. } => "embed",
            BlockKind::Bookmark { .. } => "bookmark",
            BlockKind::Divider => "divider",
            BlockKind::Table { .. } => "table",
            BlockKind::TableRow { .. } => "table_row",
            BlockKind::Unsupported { type_name, .. } => type_name,
        }
    }

    /// Decode one block (and its subtree) from the source's JSON.
    pub fn decode(value: &Value) -> ContentBlock {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let Some(type_name) = value.get("type").and_then(Value::as_str) else {
            tracing::debug!(block_id = %id, "block has no type tag");
            return ContentBlock::new(
                id,
                BlockKind::Unsupported {
                    type_name: String::new(),
                    reason: "missing type tag".into(),
                },
            );
        };

        let empty = Value::Object(Default::default());
        let payload = value.get(type_name).unwrap_or(&empty);

        match decode_kind(type_name, payload) {
            Ok(kind) => {
                let children = child_values(value).iter().map(ContentBlock::decode).collect();
                ContentBlock { id, kind, children }
            }
            Err(reason) => {
                tracing::debug!(block_id = %id, type_name, %reason, "unsupported block");
                ContentBlock::new(
                    id,
                    BlockKind::Unsupported {
                        type_name: type_name.to_string(),
                        reason,
                    },
                )
            }
        }
    }
}

/// Decode a sibling list.
pub fn decode_blocks(values: &[Value]) -> Vec<ContentBlock> {
    values.iter().map(ContentBlock::decode).collect()
}

/// A block's children, wherever the source put them.
///
/// Freshly fetched blocks carry children at the top level; some exports nest
/// them under the type payload instead (`block[type].children`). A non-empty
/// top-level list wins.
pub fn child_values(block: &Value) -> &[Value] {
    let direct = block.get("children").and_then(Value::as_array);
    let nested = block
        .get("type")
        .and_then(Value::as_str)
        .and_then(|t| block.get(t))
        .and_then(|payload| payload.get("children"))
        .and_then(Value::as_array);

    match (direct, nested) {
        (Some(direct), _) if !direct.is_empty() => direct,
        (_, Some(nested)) => nested,
        (Some(direct), None) => direct,
        (None, None) => &[],
    }
}

#[derive(Deserialize)]
struct TextPayload {
    #[serde(default)]
    rich_text: Vec<RichTextSpan>,
}

#[derive(Deserialize)]
struct CalloutPayload {
    #[serde(default)]
    rich_text: Vec<RichTextSpan>,
    #[serde(default)]
    icon: Option<Value>,
    #[serde(default)]
    color: Option<SmolStr>,
}

#[derive(Deserialize)]
struct CodePayload {
    #[serde(default)]
    rich_text: Vec<RichTextSpan>,
    #[serde(default)]
    language: Option<SmolStr>,
    #[serde(default)]
    caption: Vec<RichTextSpan>,
}

#[derive(Deserialize)]
struct UrlObject {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct FilePayload {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    external: Option<UrlObject>,
    #[serde(default)]
    file: Option<UrlObject>,
    #[serde(default)]
    caption: Vec<RichTextSpan>,
}

impl FilePayload {
    fn source(&self) -> Option<FileSource> {
        let external = self.external.as_ref().and_then(|o| o.url.clone());
        let hosted = self.file.as_ref().and_then(|o| o.url.clone());
        let source = match self.kind.as_deref() {
            Some("external") => external.map(FileSource::External),
            Some("file") => hosted.map(FileSource::Hosted),
            _ => external
                .map(FileSource::External)
                .or(hosted.map(FileSource::Hosted)),
        };
        source.filter(|s| !s.url().is_empty())
    }
}

#[derive(Deserialize)]
struct LinkPayload {
    url: String,
    #[serde(default)]
    caption: Vec<RichTextSpan>,
}

#[derive(Deserialize)]
struct TablePayload {
    #[serde(default)]
    table_width: usize,
    #[serde(default)]
    has_column_header: bool,
    #[serde(default)]
    has_row_header: bool,
}

#[derive(Deserialize)]
struct TableRowPayload {
    #[serde(default)]
    cells: Vec<Vec<RichTextSpan>>,
}

fn payload<'a, T: Deserialize<'a>>(value: &'a Value) -> Result<T, String> {
    T::deserialize(value).map_err(|e| e.to_string())
}

fn decode_kind(type_name: &str, value: &Value) -> Result<BlockKind, String> {
    let kind = match type_name {
        "paragraph" => BlockKind::Paragraph {
            text: payload::<TextPayload>(value)?.rich_text,
        },
        "heading_1" | "heading_2" | "heading_3" => BlockKind::Heading {
            level: match type_name {
                "heading_1" => 1,
                "heading_2" => 2,
                _ => 3,
            },
            text: payload::<TextPayload>(value)?.rich_text,
        },
        "bulleted_list_item" => BlockKind::BulletedListItem {
            text: payload::<TextPayload>(value)?.rich_text,
        },
        "numbered_list_item" => BlockKind::NumberedListItem {
            text: payload::<TextPayload>(value)?.rich_text,
        },
        "quote" => BlockKind::Quote {
            text: payload::<TextPayload>(value)?.rich_text,
        },
        "callout" => {
            let p: CalloutPayload = payload(value)?;
            let icon = p
                .icon
                .as_ref()
                .and_then(|icon| icon.get("emoji"))
                .and_then(Value::as_str)
                .map(str::to_string);
            BlockKind::Callout {
                text: p.rich_text,
                icon,
                color: p.color.filter(|c| c != "default"),
            }
        }
        "code" => {
            let p: CodePayload = payload(value)?;
            BlockKind::Code {
                text: p.rich_text,
                language: p.language.unwrap_or_else(|| SmolStr::new_static("plain text")),
                caption: p.caption,
            }
        }
        "image" => {
            let p: FilePayload = payload(value)?;
            BlockKind::Image {
                source: p.source(),
                caption: p.caption,
            }
        }
        "video" => {
            let p: FilePayload = payload(value)?;
            let source = p.source().ok_or_else(|| "video has no URL".to_string())?;
            BlockKind::Video {
                source,
                caption: p.caption,
            }
        }
        "embed" => {
            let p: LinkPayload = payload(value)?;
            BlockKind::Embed {
                url: p.url,
                caption: p.caption,
            }
        }
        "bookmark" => {
            let p: LinkPayload = payload(value)?;
            BlockKind::Bookmark {
                url: p.url,
                caption: p.caption,
            }
        }
        "divider" => BlockKind::Divider,
        "table" => {
            let p: TablePayload = payload(value)?;
            BlockKind::Table {
                width: p.table_width,
                has_column_header: p.has_column_header,
                has_row_header: p.has_row_header,
            }
        }
        "table_row" => BlockKind::TableRow {
            cells: payload::<TableRowPayload>(value)?.cells,
        },
        _ => return Err("unsupported block type".into()),
    };
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn span_json(text: &str) -> Value {
        json!({
            "type": "text",
            "text": { "content": text, "link": null },
            "annotations": {
                "bold": false, "italic": false, "strikethrough": false,
                "underline": false, "code": false, "color": "default"
            },
            "plain_text": text,
            "href": null
        })
    }

    #[test]
    fn test_decode_paragraph() {
        let block = ContentBlock::decode(&json!({
            "id": "p1",
            "type": "paragraph",
            "paragraph": { "rich_text": [span_json("hello")] }
        }));
        assert_eq!(block.id, "p1");
        assert_eq!(
            block.kind,
            BlockKind::Paragraph {
                text: vec![RichTextSpan::plain("hello")]
            }
        );
    }

    #[test]
    fn test_span_link_from_text_object() {
        let span: RichTextSpan = serde_json::from_value(json!({
            "type": "text",
            "text": { "content": "site", "link": { "url": "https://example.com" } },
            "annotations": { "bold": true, "color": "red" }
        }))
        .unwrap();
        assert_eq!(span.text, "site");
        assert_eq!(span.href.as_deref(), Some("https://example.com"));
        assert!(span.annotations.bold);
        assert_eq!(span.annotations.color_token(), Some("red"));
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        let block = ContentBlock::decode(&json!({
            "id": "x",
            "type": "synced_block",
            "synced_block": {}
        }));
        assert!(matches!(
            block.kind,
            BlockKind::Unsupported { ref type_name, .. } if type_name == "synced_block"
        ));
    }

    #[test]
    fn test_malformed_payload_is_unsupported() {
        let block = ContentBlock::decode(&json!({
            "id": "b",
            "type": "bookmark",
            "bookmark": { "caption": [] }
        }));
        assert!(matches!(block.kind, BlockKind::Unsupported { .. }));
        assert_eq!(block.type_name(), "bookmark");
    }

    #[test]
    fn test_children_at_either_location() {
        let top = json!({
            "id": "a",
            "type": "bulleted_list_item",
            "bulleted_list_item": { "rich_text": [] },
            "children": [{ "id": "c1", "type": "divider", "divider": {} }]
        });
        let nested = json!({
            "id": "a",
            "type": "bulleted_list_item",
            "bulleted_list_item": {
                "rich_text": [],
                "children": [{ "id": "c2", "type": "divider", "divider": {} }]
            },
            "children": []
        });
        assert_eq!(ContentBlock::decode(&top).children[0].id, "c1");
        assert_eq!(ContentBlock::decode(&nested).children[0].id, "c2");
        assert!(child_values(&json!({ "id": "z", "type": "divider" })).is_empty());
    }

    #[test]
    fn test_image_sources() {
        let hosted = ContentBlock::decode(&json!({
            "id": "i1",
            "type": "image",
            "image": { "type": "file", "file": { "url": "https://s3/x.png?sig=1" }, "caption": [] }
        }));
        assert_eq!(
            hosted.kind,
            BlockKind::Image {
                source: Some(FileSource::Hosted("https://s3/x.png?sig=1".into())),
                caption: vec![]
            }
        );

        let missing = ContentBlock::decode(&json!({
            "id": "i2",
            "type": "image",
            "image": { "type": "external", "caption": [span_json("cap")] }
        }));
        assert_eq!(
            missing.kind,
            BlockKind::Image {
                source: None,
                caption: vec![RichTextSpan::plain("cap")]
            }
        );
    }

    #[test]
    fn test_video_without_url_is_unsupported() {
        let block = ContentBlock::decode(&json!({
            "id": "v",
            "type": "video",
            "video": { "type": "external", "external": {} }
        }));
        assert!(matches!(block.kind, BlockKind::Unsupported { .. }));
    }

    #[test]
    fn test_callout_icon_and_color() {
        let block = ContentBlock::decode(&json!({
            "id": "c",
            "type": "callout",
            "callout": {
                "rich_text": [span_json("note")],
                "icon": { "type": "emoji", "emoji": "💡" },
                "color": "gray_background"
            }
        }));
        match block.kind {
            BlockKind::Callout { icon, color, .. } => {
                assert_eq!(icon.as_deref(), Some("💡"));
                assert_eq!(color.as_deref(), Some("gray_background"));
            }
            other => panic!("expected callout, got {other:?}"),
        }
    }
}
