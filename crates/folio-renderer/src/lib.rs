//! Folio renderer
//!
//! Turns block-structured posts from the content source into render trees and
//! HTML, rewriting image URLs to locally cached copies.
//!
//! The pipeline, leaves first:
//! - [`richtext`]: annotated spans to inline nodes
//! - [`blocks`]: one block to one [`RenderNode`]
//! - [`grouping`]: list runs into containers, recursively
//! - [`assets`]: cache keys, downloads, and the persisted URL map
//! - [`page`]: a whole [`Document`] to a [`RenderedPage`]

pub mod assets;
pub mod blocks;
pub mod document;
pub mod error;
pub mod grouping;
pub mod highlight;
pub mod html;
pub mod index;
pub mod media;
pub mod meta;
pub mod model;
pub mod node;
pub mod page;
pub mod richtext;
pub mod toc;

pub use assets::{AssetCache, AssetFetcher, AssetMap, BuildReport, HttpFetcher, RetryPolicy};
pub use blocks::{RenderContext, render_block};
pub use document::Document;
pub use error::{AssetError, ContentError};
pub use grouping::{Group, group_siblings, render_blocks};
pub use html::render_html;
pub use index::PostIndex;
pub use meta::{PostMeta, default_cover};
pub use model::{BlockKind, ContentBlock, RichTextSpan};
pub use node::RenderNode;
pub use page::{RenderedPage, render_article, render_document};
pub use richtext::{EmphasisMode, InlineNode};
pub use toc::{TocEntry, table_of_contents};
