use crate::QuarryError;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use url::Url;

/// Directory of downloaded PDF files
///
/// Files are named after the last segment of the URL path, so two URLs with
/// the same basename share a file (last writer wins). The directory is
/// created on first use.
#[derive(Debug)]
pub struct PdfCache {
    dir: PathBuf,
    created: OnceCell<()>,
}

impl PdfCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            created: OnceCell::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a PDF from `url` is stored at
    ///
    /// Returns `None` when the URL path has no usable basename.
    pub fn path_for(&self, url: &Url) -> Option<PathBuf> {
        let basename = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")?;
        Some(self.dir.join(basename))
    }

    /// Writes `bytes` to the cache and reads them back
    ///
    /// # Returns
    ///
    /// * `Ok((PathBuf, Vec<u8>))` - Where the file lives and its contents as stored
    /// * `Err(QuarryError::PdfCache)` - The directory or file could not be written
    pub async fn store(&self, url: &Url, bytes: &[u8]) -> Result<(PathBuf, Vec<u8>), QuarryError> {
        let path = self.path_for(url).unwrap_or_else(|| {
            let digest = super::sha256_hex(url.as_str().as_bytes());
            self.dir.join(format!("{}.pdf", digest))
        });

        self.created
            .get_or_try_init(|| async {
                tokio::fs::create_dir_all(&self.dir)
                    .await
                    .map_err(|source| QuarryError::PdfCache {
                        path: self.dir.clone(),
                        source,
                    })
            })
            .await?;

        let to_error = |source: std::io::Error| QuarryError::PdfCache {
            path: path.clone(),
            source,
        };
        tokio::fs::write(&path, bytes).await.map_err(to_error)?;
        let stored = tokio::fs::read(&path).await.map_err(to_error)?;

        Ok((path, stored))
    }
}
