use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ContentError;
use crate::meta::PostMeta;

/// Listing data for the blog index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostIndex {
    pub posts: Vec<PostMeta>,
    pub last_updated: String,
}

impl PostIndex {
    /// Posts newest first. Posts without a publish date sort last; ties keep
    /// their input order.
    pub fn new(mut posts: Vec<PostMeta>, now: DateTime<Utc>) -> Self {
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Self {
            posts,
            last_updated: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Build from raw page objects, skipping (and logging) any that lack an id.
    pub fn from_pages(pages: &[Value], now: DateTime<Utc>) -> Self {
        let posts = pages
            .iter()
            .filter_map(|page| match PostMeta::from_page(page) {
                Ok(meta) => {
                    tracing::debug!(slug = %meta.slug, title = %meta.title, "indexed post");
                    Some(meta)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping page");
                    None
                }
            })
            .collect();
        Self::new(posts, now)
    }

    pub fn find(&self, slug: &str) -> Option<&PostMeta> {
        crate::meta::find_by_slug(&self.posts, slug)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ContentError> {
        let path = path.as_ref();
        let io_err = |source| ContentError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(ContentError::Encode)?;
        std::fs::write(path, json).map_err(io_err)
    }
}
