//! Rich-text spans to inline render nodes.

use serde::Serialize;
use smol_str::SmolStr;

use crate::model::RichTextSpan;

/// Visual emphasis applied to a text run, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    Bold,
    Italic,
    Strikethrough,
    Underline,
}

/// How multiple emphasis flags on one span combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmphasisMode {
    /// Only the highest-precedence flag is honored.
    #[default]
    Precedence,
    /// Every set flag is applied, nested in precedence order.
    Compose,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "style", rename_all = "lowercase")]
pub enum InlineStyle {
    /// Fixed monospace style; other emphasis is ignored.
    Code,
    /// Zero or more emphasis marks, outermost first.
    Text { marks: Vec<Emphasis> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineNode {
    pub text: String,
    pub style: InlineStyle,
    pub color: Option<SmolStr>,
    pub href: Option<String>,
}

impl InlineNode {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: InlineStyle::Text { marks: Vec::new() },
            color: None,
            href: None,
        }
    }
}

/// Format spans into inline nodes, one per span, preserving order.
pub fn format_spans(spans: &[RichTextSpan], mode: EmphasisMode) -> Vec<InlineNode> {
    spans.iter().map(|span| format_span(span, mode)).collect()
}

pub fn format_span(span: &RichTextSpan, mode: EmphasisMode) -> InlineNode {
    let a = &span.annotations;

    let style = if a.code {
        InlineStyle::Code
    } else {
        let flags = [
            (a.bold, Emphasis::Bold),
            (a.italic, Emphasis::Italic),
            (a.strikethrough, Emphasis::Strikethrough),
            (a.underline, Emphasis::Underline),
        ];
        let set = flags.iter().filter(|(on, _)| *on).map(|(_, e)| *e);
        let marks = match mode {
            EmphasisMode::Precedence => set.take(1).collect(),
            EmphasisMode::Compose => set.collect(),
        };
        InlineStyle::Text { marks }
    };

    InlineNode {
        text: span.text.clone(),
        style,
        color: a.color_token().map(SmolStr::new),
        href: span.href.clone(),
    }
}
