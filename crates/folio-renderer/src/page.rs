//! Whole-document rendering.

use std::fmt::Display;

use pulldown_cmark_escape::escape_html;

use crate::blocks::RenderContext;
use crate::document::Document;
use crate::grouping::render_blocks;
use crate::html::write_nodes;
use crate::meta::PostMeta;
use crate::node::RenderNode;
use crate::toc::{TocEntry, table_of_contents};

/// Shown in place of a post whose content could not be loaded.
pub const UNAVAILABLE_HTML: &str =
    "<div class=\"content-unavailable\"><p>This content is currently unavailable.</p></div>\n";

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub meta: PostMeta,
    /// Cover URL after asset resolution, defaulted when the post has none.
    pub cover: String,
    pub body: Vec<RenderNode>,
    pub toc: Vec<TocEntry>,
}

impl RenderedPage {
    pub fn body_html(&self) -> String {
        let mut html = String::from("<article class=\"notion-content\">\n");
        write_nodes(&mut html, &self.body);
        html.push_str("</article>\n");
        html
    }

    /// Minimal standalone page around the body, for previews.
    pub fn standalone_html(&self) -> String {
        let mut html = String::from("<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n<title>");
        let _ = escape_html(&mut html, &self.meta.title);
        html.push_str("</title>\n</head>\n<body>\n<header><img class=\"cover\" src=\"");
        let _ = escape_html(&mut html, &self.cover);
        html.push_str("\" alt=\"\" /><h1>");
        let _ = escape_html(&mut html, &self.meta.title);
        html.push_str("</h1></header>\n");
        html.push_str(&self.body_html());
        html.push_str("</body>\n</html>\n");
        html
    }
}

pub fn render_document(doc: &Document, ctx: &RenderContext<'_>) -> RenderedPage {
    let body = render_blocks(&doc.blocks, ctx);
    let toc = table_of_contents(&body);
    RenderedPage {
        meta: doc.meta.clone(),
        cover: ctx.assets.resolve(doc.meta.cover_or_default()),
        body,
        toc,
    }
}

/// Body HTML for a load result. A failed load renders the unavailable state.
pub fn render_article<E: Display>(loaded: Result<Document, E>, ctx: &RenderContext<'_>) -> String {
    match loaded {
        Ok(doc) => render_document(&doc, ctx).body_html(),
        Err(e) => {
            tracing::error!(error = %e, "post content unavailable");
            UNAVAILABLE_HTML.to_string()
        }
    }
}
