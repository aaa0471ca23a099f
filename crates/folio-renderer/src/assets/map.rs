use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::key::cache_key;
use crate::error::AssetError;

/// Persisted mapping from remote asset URLs (and their cache keys) to the
/// public paths of locally cached copies.
///
/// Serialized as a flat JSON object with sorted keys. Loaded once, then only
/// read, so a single map can back any number of concurrent renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetMap {
    entries: BTreeMap<String, String>,
}

impl AssetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Local path for `url`, trying the raw URL, then its cache key, then
    /// giving back the URL unchanged.
    pub fn resolve(&self, url: &str) -> String {
        if let Some(path) = self.entries.get(url) {
            return path.clone();
        }
        let key = cache_key(url);
        if let Some(path) = self.entries.get(&key) {
            return path.clone();
        }
        url.to_string()
    }

    /// Local path only if the asset is cached.
    pub fn lookup(&self, url: &str) -> Option<&str> {
        self.entries
            .get(url)
            .or_else(|| self.entries.get(&cache_key(url)))
            .map(String::as_str)
    }

    pub fn insert(&mut self, url: impl Into<String>, path: impl Into<String>) {
        self.entries.insert(url.into(), path.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Read a map from disk. A missing file is an empty map.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(AssetError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes).map_err(|source| AssetError::MapParse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Like [`AssetMap::load`], but any failure degrades to an empty map so
    /// rendering falls back to remote URLs.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "asset map unreadable, using remote URLs");
                Self::default()
            }
        }
    }

    /// Write the map atomically: a sibling temp file, then a rename.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let path = path.as_ref();
        let io_err = |source| AssetError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut json = serde_json::to_string_pretty(self).map_err(AssetError::MapEncode)?;
        json.push('\n');

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}
