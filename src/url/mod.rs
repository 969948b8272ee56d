//! URL handling module for Quarry
//!
//! This module provides URL normalization, link resolution, the allow/deny
//! URL filter, and host glob matching for rate-limit grouping.

mod filter;
mod matcher;
mod normalize;

pub use filter::UrlFilter;
pub use matcher::{glob_matches, host_key};
pub use normalize::{canonical_key, normalize_parsed, normalize_url, resolve_link};
