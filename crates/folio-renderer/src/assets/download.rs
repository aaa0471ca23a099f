//! Build-time asset download and map persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use folio_common::config::SiteConfig;
use futures_util::StreamExt;

use super::key::{ASSET_SUBDIR, cache_key, local_filename, public_path};
use super::map::AssetMap;
use crate::error::AssetError;

/// Source of asset bytes. The HTTP implementation is [`HttpFetcher`]; tests
/// substitute an in-memory one.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, AssetError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub const USER_AGENT: &'static str = concat!("folio/", env!("CARGO_PKG_VERSION"));
    pub const TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Result<Self, AssetError> {
        let client = reqwest::Client::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|source| AssetError::Fetch {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, AssetError> {
        let fetch_err = |source| AssetError::Fetch {
            url: url.to_string(),
            source,
        };
        let resp = self.client.get(url).send().await.map_err(fetch_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AssetError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        resp.bytes().await.map_err(fetch_err)
    }
}

/// Bounded retries with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Every observed URL sharing one cache key. `urls[0]` is the first seen and
/// the one downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetGroup {
    pub key: String,
    pub urls: Vec<String>,
}

/// Group URLs by cache key, keeping first-seen order for both groups and the
/// URLs inside them. Duplicate URLs collapse.
pub fn group_by_key<I, S>(urls: I) -> Vec<AssetGroup>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups: Vec<AssetGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for url in urls {
        let url = url.as_ref();
        if url.is_empty() {
            continue;
        }
        let key = cache_key(url);
        match index.get(&key) {
            Some(&i) => {
                let group = &mut groups[i];
                if !group.urls.iter().any(|u| u == url) {
                    group.urls.push(url.to_string());
                }
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(AssetGroup {
                    key,
                    urls: vec![url.to_string()],
                });
            }
        }
    }
    groups
}

/// Outcome counts of one cache build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Entries written to the persisted map.
    pub mapped: usize,
}

/// On-disk asset cache: a directory of content-addressed files plus the map
/// file that points at them.
#[derive(Debug, Clone)]
pub struct AssetCache {
    asset_dir: PathBuf,
    map_path: PathBuf,
    concurrency: usize,
    retry: RetryPolicy,
}

impl AssetCache {
    pub fn new(public_dir: impl AsRef<Path>, map_path: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: public_dir.as_ref().join(ASSET_SUBDIR),
            map_path: map_path.into(),
            concurrency: SiteConfig::DEFAULT_CONCURRENCY,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(&config.public_dir, config.asset_map_path.clone())
            .with_concurrency(config.download_concurrency)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    pub fn map_path(&self) -> &Path {
        &self.map_path
    }

    /// Download every not-yet-cached asset among `urls` and rewrite the map.
    ///
    /// Keys whose file already exists are never fetched again. Failed
    /// downloads are logged and left out of the map; they never abort the
    /// batch. The map is rebuilt from this batch's URLs and written once, at
    /// the end.
    pub async fn build<I, S, F>(&self, urls: I, fetcher: &F) -> Result<BuildReport, AssetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: AssetFetcher + ?Sized,
    {
        let groups = group_by_key(urls);
        let mut report = BuildReport::default();

        tokio::fs::create_dir_all(&self.asset_dir)
            .await
            .map_err(|source| AssetError::Io {
                path: self.asset_dir.display().to_string(),
                source,
            })?;

        let mut pending = Vec::new();
        for group in &groups {
            let dest = self.asset_dir.join(local_filename(&group.key));
            if file_exists(&dest).await {
                tracing::debug!(key = %group.key, "asset already cached");
                report.skipped += 1;
            } else {
                pending.push((group, dest));
            }
        }

        tracing::info!(
            total = groups.len(),
            pending = pending.len(),
            skipped = report.skipped,
            "building asset cache"
        );

        let outcomes: Vec<bool> = futures_util::stream::iter(
            pending
                .iter()
                .map(|(group, dest)| self.download(fetcher, group, dest)),
        )
        .buffer_unordered(self.concurrency)
        .map(|result| result.is_ok())
        .collect()
        .await;

        for ok in outcomes {
            if ok {
                report.downloaded += 1;
            } else {
                report.failed += 1;
            }
        }

        let mut map = AssetMap::new();
        for group in &groups {
            let dest = self.asset_dir.join(local_filename(&group.key));
            if !file_exists(&dest).await {
                continue;
            }
            let public = public_path(&group.key);
            map.insert(group.key.clone(), public.clone());
            for url in &group.urls {
                map.insert(url.clone(), public.clone());
            }
        }
        report.mapped = map.len();
        map.save(&self.map_path)?;

        tracing::info!(
            downloaded = report.downloaded,
            skipped = report.skipped,
            failed = report.failed,
            mapped = report.mapped,
            path = %self.map_path.display(),
            "asset map written"
        );
        Ok(report)
    }

    async fn download<F>(&self, fetcher: &F, group: &AssetGroup, dest: &Path) -> Result<(), AssetError>
    where
        F: AssetFetcher + ?Sized,
    {
        let url = &group.urls[0];
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;

        loop {
            match fetcher.fetch(url).await {
                Ok(bytes) => {
                    if let Err(e) = write_atomic(dest, &bytes).await {
                        tracing::error!(url = %url, file = %dest.display(), error = %e, "failed to store asset");
                        return Err(e);
                    }
                    tracing::info!(url = %url, file = %dest.display(), bytes = bytes.len(), "downloaded asset");
                    return Ok(());
                }
                Err(e) if attempt < attempts => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(url = %url, attempt, error = %e, ?delay, "asset download failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(url = %url, attempts, error = %e, "giving up on asset");
                    return Err(e);
                }
            }
        }
    }
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Write through a `.part` sibling so an interrupted run never leaves a
/// truncated file that later runs would treat as cached.
async fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), AssetError> {
    let io_err = |source| AssetError::Io {
        path: dest.display().to_string(),
        source,
    };
    let mut part = dest.as_os_str().to_owned();
    part.push(".part");
    let written = match tokio::fs::write(&part, bytes).await {
        Ok(()) => tokio::fs::rename(&part, dest).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(io_err(e));
    }
    Ok(())
}
