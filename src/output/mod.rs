//! Output module for crawl records and statistics
//!
//! This module handles:
//! - Streaming one JSON record per page to a newline-delimited file
//! - Recording crawl statistics and printing the final summary

mod sink;
pub mod stats;

pub use sink::{open_file, spawn, OutputSink, SinkWriter, DEFAULT_CAPACITY};
pub use stats::{print_statistics, CrawlStats, StatsRecorder};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to open output file {path}: {source}")]
    Open {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write output: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Output writer has stopped")]
    Closed,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
