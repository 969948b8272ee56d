//! Quarry: a configuration-driven record crawler
//!
//! This crate crawls a site from a start URL, extracts fields from HTML pages
//! and linked PDF documents using CSS selectors or templates, and streams one
//! JSON record per page to a newline-delimited output file.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;
pub mod template;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Quarry operations
///
/// Every variant is fatal for the run. Per-page failures (fetch errors,
/// unparseable PDFs) are logged where they happen and never become a
/// `QuarryError`.
#[derive(Debug, Error)]
pub enum QuarryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Template for field '{field}' failed to render: {source}")]
    Template {
        field: String,
        source: minijinja::Error,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Failed to cache PDF at {path}: {source}")]
    PdfCache {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid URL pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Invalid selector '{selector}' for field '{field}': {message}")]
    InvalidSelector {
        field: String,
        selector: String,
        message: String,
    },

    #[error("Invalid template for field '{field}': {source}")]
    InvalidTemplate {
        field: String,
        source: minijinja::Error,
    },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Quarry operations
pub type Result<T> = std::result::Result<T, QuarryError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::config::{CompiledConfig, Config};
pub use crate::crawler::{crawl, RunMode};
pub use crate::extract::ExtractedDocument;
pub use crate::url::UrlFilter;
