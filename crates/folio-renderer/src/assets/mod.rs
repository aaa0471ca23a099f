//! Local caching of remote images.
//!
//! Signed image URLs from the content source expire within hours, so the build
//! downloads each distinct asset once into a content-addressed file under the
//! public directory and records where it went in an [`AssetMap`]. Renders
//! consult the map and fall back to the remote URL on a miss.

mod download;
mod key;
mod map;

pub use download::{
    AssetCache, AssetFetcher, AssetGroup, BuildReport, HttpFetcher, RetryPolicy, group_by_key,
};
pub use key::{
    ASSET_SUBDIR, DEFAULT_EXTENSION, PUBLIC_PREFIX, SIGNED_HOSTS, cache_key, extension,
    local_filename, public_path,
};
pub use map::AssetMap;

use crate::document::Document;
use crate::model::{BlockKind, ContentBlock};

/// Image URLs in a block tree, depth first, in document order.
pub fn collect_image_urls(blocks: &[ContentBlock]) -> Vec<String> {
    let mut urls = Vec::new();
    walk_images(blocks, &mut urls);
    urls
}

fn walk_images(blocks: &[ContentBlock], urls: &mut Vec<String>) {
    for block in blocks {
        if let BlockKind::Image {
            source: Some(source),
            ..
        } = &block.kind
        {
            urls.push(source.url().to_string());
        }
        walk_images(&block.children, urls);
    }
}

/// Every asset URL a document references: its cover first, then body images.
pub fn document_asset_urls(doc: &Document) -> Vec<String> {
    let mut urls: Vec<String> = doc.meta.cover.iter().cloned().collect();
    urls.extend(collect_image_urls(&doc.blocks));
    urls
}
