//! On-disk caches
//!
//! - [`ResponseCache`]: HTTP bodies and response metadata keyed by URL hash
//! - [`PdfCache`]: PDF files keyed by the basename of their URL path
//!
//! Neither cache is evicted or invalidated; both persist across runs.

mod pdf;
mod response;

pub use pdf::PdfCache;
pub use response::{CachedResponse, ResponseCache};

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
