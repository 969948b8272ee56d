//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier with its visited set and per-group rate limiting
//! - HTTP fetching through the optional response cache
//! - Per-page extraction and record emission
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod limits;
mod pipeline;

pub use coordinator::Coordinator;
pub use fetcher::{
    build_http_client, ContentKind, FetchResult, FetchedPage, Fetcher, HttpFetcher,
    DEFAULT_USER_AGENT,
};
pub use frontier::{Dispatch, Frontier, Offer, RedirectClaim};
pub use limits::{LimitRule, Limits};
pub use pipeline::{Pipeline, RecordTarget};

use crate::cache::ResponseCache;
use crate::config::CompiledConfig;
use crate::output::{self, CrawlStats};
use crate::url::normalize_url;
use crate::Result;
use std::path::Path;

/// What a run does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Crawl from the configured start URL and write the output file
    Crawl,

    /// Process one URL, print its record to stdout and stop
    ///
    /// No links are followed, the response cache is bypassed and the output
    /// file is not touched.
    Test { url: String },
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client (and response cache in crawl mode)
/// 2. Open the output file (crawl mode only)
/// 3. Seed the frontier and run the worker pool until it drains
/// 4. Wait for every record to be written
///
/// # Arguments
///
/// * `config` - The compiled crawl configuration
/// * `mode` - Full crawl or single-URL test
///
/// # Returns
///
/// * `Ok(CrawlStats)` - Crawl completed successfully
/// * `Err(QuarryError)` - Crawl failed; an output write failure takes
///   precedence over the error the workers saw
pub async fn crawl(config: CompiledConfig, mode: RunMode) -> Result<CrawlStats> {
    let seed = match &mode {
        RunMode::Crawl => normalize_url(&config.config.input.start_url)?,
        RunMode::Test { url } => normalize_url(url)?,
    };

    let cache = match mode {
        RunMode::Crawl if config.config.cache.responses => {
            Some(ResponseCache::new(&config.config.cache.response_dir))
        }
        _ => None,
    };
    if let Some(cache) = &cache {
        tracing::debug!("Response cache at {}", cache.dir().display());
    }

    let fetcher = HttpFetcher::new(&config.config.user_agent, config.timeout(), cache)?;

    match mode {
        RunMode::Crawl => {
            let path = Path::new(&config.config.output.filename).to_path_buf();
            let (sink, writer) = output::open_file(&path).await?;

            let result = Coordinator::new(config, fetcher, RecordTarget::Sink(sink), &mode)
                .run(seed)
                .await;

            // The coordinator has dropped every sink handle by now
            match (result, writer.finish().await) {
                (_, Err(e)) => Err(e.into()),
                (Err(e), Ok(_)) => Err(e),
                (Ok(stats), Ok(lines)) => {
                    tracing::info!("Wrote {} records to {}", lines, path.display());
                    Ok(stats)
                }
            }
        }
        RunMode::Test { .. } => {
            Coordinator::new(config, fetcher, RecordTarget::Stdout, &mode)
                .run(seed)
                .await
        }
    }
}
