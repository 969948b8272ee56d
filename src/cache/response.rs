use super::sha256_hex;
use crate::template::ResponseInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// Sidecar stored next to every cached body
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheMeta {
    url: String,
    status: u16,
    headers: BTreeMap<String, String>,
    fetched_at: DateTime<Utc>,
}

/// A response read back from the cache
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// Final URL of the original response, after redirects
    pub final_url: Url,
    pub response: ResponseInfo,
    pub body: Vec<u8>,
    pub fetched_at: DateTime<Utc>,
}

/// Directory of successful HTTP responses
///
/// Layout: `<dir>/<aa>/<sha256>` holds the body and `<dir>/<aa>/<sha256>.meta.json`
/// the status and headers, where `<sha256>` is the digest of the URL and
/// `<aa>` its first two hex digits.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of the cache
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn paths(&self, url: &Url) -> (PathBuf, PathBuf) {
        let digest = sha256_hex(url.as_str().as_bytes());
        let shard = self.dir.join(&digest[..2]);
        let meta = shard.join(format!("{}.meta.json", digest));
        (shard.join(digest), meta)
    }

    /// Looks up a cached response
    ///
    /// # Returns
    ///
    /// * `Ok(Some(CachedResponse))` - Both the body and its sidecar exist
    /// * `Ok(None)` - Not cached, or the sidecar is unreadable
    /// * `Err(io::Error)` - The cache directory could not be read
    pub async fn load(&self, url: &Url) -> io::Result<Option<CachedResponse>> {
        let (body_path, meta_path) = self.paths(url);

        let meta_bytes = match tokio::fs::read(&meta_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let meta: CacheMeta = match serde_json::from_slice(&meta_bytes) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!("Ignoring corrupt cache entry {}: {}", meta_path.display(), e);
                return Ok(None);
            }
        };

        let body = match tokio::fs::read(&body_path).await {
            Ok(body) => body,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let final_url = Url::parse(&meta.url).unwrap_or_else(|_| url.clone());

        Ok(Some(CachedResponse {
            final_url,
            response: ResponseInfo {
                status: meta.status,
                headers: meta.headers,
            },
            body,
            fetched_at: meta.fetched_at,
        }))
    }

    /// Stores a response body and its metadata under the requested `url`
    ///
    /// The body is written before the sidecar, so a partially written entry
    /// is never loaded.
    pub async fn store(
        &self,
        url: &Url,
        final_url: &Url,
        response: &ResponseInfo,
        body: &[u8],
    ) -> io::Result<()> {
        let (body_path, meta_path) = self.paths(url);

        if let Some(shard) = body_path.parent() {
            tokio::fs::create_dir_all(shard).await?;
        }

        tokio::fs::write(&body_path, body).await?;

        let meta = CacheMeta {
            url: final_url.to_string(),
            status: response.status,
            headers: response.headers.clone(),
            fetched_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&meta).map_err(io::Error::other)?;
        tokio::fs::write(&meta_path, json).await
    }
}
