//! HTTP client for the Notion content source.
//!
//! The client only moves JSON around: pages and blocks come back as
//! [`serde_json::Value`] in the shape the API returns them, with one addition:
//! blocks that report `has_children` get their children fetched recursively and
//! attached under a top-level `children` key. Decoding into typed blocks is the
//! renderer's job.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::config::{NOTION_VERSION, NotionConfig};
use crate::error::SourceError;

const PAGE_SIZE: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct Paginated {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    next_cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

impl Paginated {
    fn next(&self) -> Option<&str> {
        if self.has_more || self.next_cursor.is_some() {
            self.next_cursor.as_deref()
        } else {
            None
        }
    }
}

#[derive(Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    config: NotionConfig,
}

impl NotionClient {
    pub fn new(config: NotionConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| SourceError::Request {
                endpoint: config.api_base.to_string(),
                source,
            })?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        self.config
            .api_base
            .join(path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}{}", self.config.api_base, path))
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.config.api_key)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn send_json(&self, endpoint: &str, req: RequestBuilder) -> Result<Value, SourceError> {
        let resp = self
            .authorized(req)
            .send()
            .await
            .map_err(|source| SourceError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(endpoint, status = status.as_u16(), "content source request failed");
            return Err(SourceError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await.map_err(|source| SourceError::Request {
            endpoint: endpoint.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| SourceError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    fn decode_page(endpoint: &str, value: Value) -> Result<Paginated, SourceError> {
        serde_json::from_value(value).map_err(|source| SourceError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// All published posts, newest first.
    pub async fn query_published(&self) -> Result<Vec<Value>, SourceError> {
        let endpoint = self.endpoint(&format!("databases/{}/query", self.config.database_id));
        let now = Utc::now();
        let mut posts = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = published_posts_query(now, cursor.as_deref());
            let value = self
                .send_json(&endpoint, self.http.post(&endpoint).json(&body))
                .await?;
            let page = Self::decode_page(&endpoint, value)?;
            let next = page.next().map(str::to_string);
            posts.extend(page.results);
            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::debug!(count = posts.len(), "queried published posts");
        Ok(posts)
    }

    /// A single page object (properties and cover, no blocks).
    pub async fn fetch_page(&self, page_id: &str) -> Result<Value, SourceError> {
        let endpoint = self.endpoint(&format!("pages/{page_id}"));
        self.send_json(&endpoint, self.http.get(&endpoint)).await
    }

    /// All child blocks of `block_id`, with nested children attached.
    pub async fn fetch_block_children(&self, block_id: &str) -> Result<Vec<Value>, SourceError> {
        let endpoint = self.endpoint(&format!("blocks/{block_id}/children"));
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let url = children_url(&endpoint, cursor.as_deref());
            let value = self.send_json(&endpoint, self.http.get(url)).await?;
            let page = Self::decode_page(&endpoint, value)?;
            let next = page.next().map(str::to_string);

            for mut block in page.results {
                let has_children = block
                    .get("has_children")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if has_children {
                    if let Some(id) = block.get("id").and_then(Value::as_str).map(str::to_string) {
                        let children = Box::pin(self.fetch_block_children(&id)).await?;
                        if let Some(obj) = block.as_object_mut() {
                            obj.insert("children".into(), Value::Array(children));
                        }
                    }
                }
                blocks.push(block);
            }

            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(blocks)
    }
}

/// Database query body selecting non-draft posts published at or before `now`.
pub fn published_posts_query(now: DateTime<Utc>, cursor: Option<&str>) -> Value {
    let mut body = json!({
        "filter": {
            "and": [
                { "property": "draft", "checkbox": { "equals": false } },
                {
                    "property": "publishAt",
                    "date": { "on_or_before": now.to_rfc3339_opts(SecondsFormat::Millis, true) }
                }
            ]
        },
        "sorts": [ { "property": "publishAt", "direction": "descending" } ],
        "page_size": PAGE_SIZE,
    });
    if let (Some(cursor), Some(obj)) = (cursor, body.as_object_mut()) {
        obj.insert("start_cursor".into(), Value::String(cursor.to_string()));
    }
    body
}

fn children_url(endpoint: &str, cursor: Option<&str>) -> String {
    match Url::parse(endpoint) {
        Ok(mut url) => {
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("page_size", &PAGE_SIZE.to_string());
                if let Some(cursor) = cursor {
                    query.append_pair("start_cursor", cursor);
                }
            }
            url.to_string()
        }
        Err(_) => endpoint.to_string(),
    }
}
