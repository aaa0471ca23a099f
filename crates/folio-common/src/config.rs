use std::path::{Path, PathBuf};

use url::Url;

use crate::error::ConfigError;

/// Default base URL of the Notion REST API.
pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1/";

/// API version header sent with every content source request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Load `.env` and then `.env.local` from `dir`.
///
/// Variables already present in the process environment are never overridden,
/// and `.env.local` only fills in keys that `.env` did not set. Missing files
/// are skipped; a file that fails to parse is an error.
pub fn load_dotenv(dir: impl AsRef<Path>) -> Result<(), ConfigError> {
    let dir = dir.as_ref();
    for name in [".env", ".env.local"] {
        let path = dir.join(name);
        if !path.exists() {
            continue;
        }
        dotenvy::from_path(&path).map_err(|e| ConfigError::EnvFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

/// Credentials and endpoint for the content source.
#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub api_key: String,
    pub database_id: String,
    pub api_base: Url,
}

impl NotionConfig {
    /// Load from environment variables.
    ///
    /// Required env vars:
    /// - `NOTION_API_KEY`: integration token
    /// - `NOTION_DATABASE_ID`: id of the posts database
    ///
    /// Optional env vars:
    /// - `NOTION_API_BASE`: API root (default: https://api.notion.com/v1/)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = non_empty(&lookup, "NOTION_API_KEY")?;
        let database_id = non_empty(&lookup, "NOTION_DATABASE_ID")?;

        let base = lookup("NOTION_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = Url::parse(&base).map_err(|e| ConfigError::UrlParse {
            url: base.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            api_key,
            database_id,
            api_base,
        })
    }
}

/// Site build configuration
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Directory served as the site root (cached images land under it).
    pub public_dir: PathBuf,
    /// Where the persisted URL to local path map is written.
    pub asset_map_path: PathBuf,
    /// Where the post index JSON is written.
    pub post_index_path: PathBuf,
    /// Upper bound on simultaneous asset downloads.
    pub download_concurrency: usize,
}

impl SiteConfig {
    pub const DEFAULT_PUBLIC_DIR: &'static str = "public";
    pub const DEFAULT_ASSET_MAP: &'static str = "lib/image-map.json";
    pub const DEFAULT_POST_INDEX: &'static str = "data/blog.json";
    pub const DEFAULT_CONCURRENCY: usize = 4;

    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `FOLIO_PUBLIC_DIR` (default: `public`)
    /// - `FOLIO_ASSET_MAP` (default: `lib/image-map.json`)
    /// - `FOLIO_POST_INDEX` (default: `data/blog.json`)
    /// - `FOLIO_DOWNLOAD_CONCURRENCY` (default: 4)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let public_dir = lookup("FOLIO_PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_PUBLIC_DIR));
        let asset_map_path = lookup("FOLIO_ASSET_MAP")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_ASSET_MAP));
        let post_index_path = lookup("FOLIO_POST_INDEX")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_POST_INDEX));

        let download_concurrency = match lookup("FOLIO_DOWNLOAD_CONCURRENCY") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                Ok(_) => {
                    return Err(ConfigError::InvalidValue {
                        var: "FOLIO_DOWNLOAD_CONCURRENCY",
                        value,
                        message: "must be at least 1".into(),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::InvalidValue {
                        var: "FOLIO_DOWNLOAD_CONCURRENCY",
                        value,
                        message: e.to_string(),
                    });
                }
            },
            None => Self::DEFAULT_CONCURRENCY,
        };

        Ok(Self {
            public_dir,
            asset_map_path,
            post_index_path,
            download_concurrency,
        })
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            public_dir: PathBuf::from(Self::DEFAULT_PUBLIC_DIR),
            asset_map_path: PathBuf::from(Self::DEFAULT_ASSET_MAP),
            post_index_path: PathBuf::from(Self::DEFAULT_POST_INDEX),
            download_concurrency: Self::DEFAULT_CONCURRENCY,
        }
    }
}

fn non_empty(
    lookup: &impl Fn(&'static str) -> Option<String>,
    var: &'static str,
) -> Result<String, ConfigError> {
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv { var }),
    }
}
