//! Post metadata pulled out of a page's property bag.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ContentError;

pub const UNTITLED: &str = "Untitled";

/// Covers used for posts that don't set one.
pub const DEFAULT_COVERS: &[&str] = &[
    "https://images.unsplash.com/photo-1494438639946-1ebd1d20bf85?auto=format&fit=crop&w=1400&q=80",
    "https://images.unsplash.com/photo-1508614999368-9260051292e5?auto=format&fit=crop&w=1400&q=80",
    "https://images.unsplash.com/photo-1557683316-973673baf926?auto=format&fit=crop&w=1400&q=80",
    "https://images.unsplash.com/photo-1483794344563-d27a8d18014e?auto=format&fit=crop&w=1400&q=80",
    "https://images.unsplash.com/photo-1550684848-fac1c5b4e853?auto=format&fit=crop&w=1400&q=80",
    "https://images.unsplash.com/photo-1579546929518-9e396f3cc809?auto=format&fit=crop&w=1400&q=80",
];

/// Deterministic default cover for a page id.
pub fn default_cover(id: &str) -> &'static str {
    let sum: u64 = id.encode_utf16().map(u64::from).sum();
    DEFAULT_COVERS[(sum % DEFAULT_COVERS.len() as u64) as usize]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMeta {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "coverImage", default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

impl PostMeta {
    /// Extract metadata from a page object. Only `id` is required; every
    /// other field degrades to a default.
    pub fn from_page(page: &Value) -> Result<Self, ContentError> {
        let id = page
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or(ContentError::MissingField { field: "id" })?
            .to_string();

        let props = page.get("properties").unwrap_or(&Value::Null);

        let title = first_plain_text(props, "title", "title").unwrap_or_else(|| UNTITLED.into());
        let slug = first_plain_text(props, "slug", "rich_text").unwrap_or_else(|| id.clone());
        let description = first_plain_text(props, "description", "rich_text").unwrap_or_default();

        let published_at = props
            .pointer("/publishAt/date/start")
            .and_then(Value::as_str)
            .map(str::to_string);

        let tags = props
            .pointer("/tags/multi_select")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            id,
            title,
            slug,
            description,
            published_at,
            tags,
            cover: cover_url(page),
        })
    }

    /// The cover, or this post's default one.
    pub fn cover_or_default(&self) -> &str {
        self.cover.as_deref().unwrap_or_else(|| default_cover(&self.id))
    }

    pub fn matches(&self, slug: &str) -> bool {
        self.slug == slug || self.id == slug
    }
}

/// `properties[name][list][0].plain_text`, if non-empty.
fn first_plain_text(props: &Value, name: &str, list: &str) -> Option<String> {
    props
        .get(name)?
        .get(list)?
        .get(0)?
        .get("plain_text")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn cover_url(page: &Value) -> Option<String> {
    let cover = page.get("cover")?;
    let url = match cover.get("type").and_then(Value::as_str) {
        Some("external") => cover.pointer("/external/url"),
        _ => cover.pointer("/file/url"),
    };
    url.and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

/// The post whose slug (or page id) is `slug`.
pub fn find_by_slug<'a>(posts: &'a [PostMeta], slug: &str) -> Option<&'a PostMeta> {
    posts.iter().find(|p| p.matches(slug))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_page() {
        let page = json!({
            "id": "page-1",
            "cover": { "type": "external", "external": { "url": "https://x.example/c.jpg" } },
            "properties": {
                "title": { "title": [{ "plain_text": "Hello" }] },
                "slug": { "rich_text": [{ "plain_text": "hello-world" }] },
                "description": { "rich_text": [{ "plain_text": "First post" }] },
                "publishAt": { "date": { "start": "2024-03-01" } },
                "tags": { "multi_select": [{ "name": "rust" }, { "name": "web" }] }
            }
        });
        let meta = PostMeta::from_page(&page).unwrap();
        assert_eq!(meta.title, "Hello");
        assert_eq!(meta.slug, "hello-world");
        assert_eq!(meta.description, "First post");
        assert_eq!(meta.published_at.as_deref(), Some("2024-03-01"));
        assert_eq!(meta.tags, ["rust", "web"]);
        assert_eq!(meta.cover.as_deref(), Some("https://x.example/c.jpg"));
    }

    #[test]
    fn test_missing_fields_default() {
        let page = json!({
            "id": "page-2",
            "properties": { "title": { "title": [] } }
        });
        let meta = PostMeta::from_page(&page).unwrap();
        assert_eq!(meta.title, UNTITLED);
        assert_eq!(meta.slug, "page-2");
        assert_eq!(meta.description, "");
        assert!(meta.tags.is_empty());
        assert_eq!(meta.cover, None);
        assert_eq!(meta.cover_or_default(), default_cover("page-2"));
    }

    #[test]
    fn test_missing_id() {
        assert!(matches!(
            PostMeta::from_page(&json!({ "properties": {} })),
            Err(ContentError::MissingField { field: "id" })
        ));
    }

    #[test]
    fn test_hosted_cover() {
        let page = json!({
            "id": "p",
            "cover": { "type": "file", "file": { "url": "https://s3.example/c.png?sig=1" } }
        });
        assert_eq!(
            PostMeta::from_page(&page).unwrap().cover.as_deref(),
            Some("https://s3.example/c.png?sig=1")
        );
    }

    #[test]
    fn test_default_cover_is_char_sum_mod_len() {
        // 'a' + 'b' = 97 + 98 = 195; 195 % 6 = 3
        assert_eq!(default_cover("ab"), DEFAULT_COVERS[3]);
        assert_eq!(default_cover(""), DEFAULT_COVERS[0]);
        assert_eq!(default_cover("ab"), default_cover("ba"));
    }

    #[test]
    fn test_find_by_slug_or_id() {
        let posts = vec![
            PostMeta::from_page(&json!({
                "id": "id-1",
                "properties": { "slug": { "rich_text": [{ "plain_text": "first" }] } }
            }))
            .unwrap(),
        ];
        assert!(find_by_slug(&posts, "first").is_some());
        assert!(find_by_slug(&posts, "id-1").is_some());
        assert!(find_by_slug(&posts, "other").is_none());
    }
}
