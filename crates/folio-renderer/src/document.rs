use std::path::Path;

use serde_json::Value;

use crate::error::ContentError;
use crate::meta::PostMeta;
use crate::model::{ContentBlock, decode_blocks};

/// One post: metadata plus its top-level blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub meta: PostMeta,
    pub blocks: Vec<ContentBlock>,
}

impl Document {
    /// Build from a page object and its (already recursively fetched) blocks.
    pub fn from_values(page: &Value, blocks: &[Value]) -> Result<Self, ContentError> {
        Ok(Self {
            meta: PostMeta::from_page(page)?,
            blocks: decode_blocks(blocks),
        })
    }

    /// Load a local export: `{ "page": <page object>, "blocks": [<block>...] }`.
    pub fn from_export(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|source| ContentError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        let page = value
            .get("page")
            .ok_or(ContentError::MissingField { field: "page" })?;
        let blocks = value
            .get("blocks")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let doc = Self::from_values(page, blocks)?;
        tracing::debug!(
            path = %path.display(),
            slug = %doc.meta.slug,
            blocks = doc.blocks.len(),
            "loaded export"
        );
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.json");
        std::fs::write(
            &path,
            json!({
                "page": { "id": "p1", "properties": {} },
                "blocks": [
                    { "id": "b1", "type": "divider", "divider": {} },
                    { "id": "b2", "type": "mystery" }
                ]
            })
            .to_string(),
        )
        .unwrap();

        let doc = Document::from_export(&path).unwrap();
        assert_eq!(doc.meta.id, "p1");
        assert_eq!(doc.blocks.len(), 2);
    }

    #[test]
    fn test_export_without_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.json");
        std::fs::write(&path, r#"{ "blocks": [] }"#).unwrap();
        assert!(matches!(
            Document::from_export(&path),
            Err(ContentError::MissingField { field: "page" })
        ));
    }
}
