//! Crawler coordinator - worker pool and run lifecycle
//!
//! This module contains the crawl loop that coordinates:
//! - Seeding the frontier with the start URL
//! - Running a fixed pool of workers over the frontier
//! - Stopping every worker on the first fatal error
//! - Progress reporting and final statistics

use super::fetcher::Fetcher;
use super::frontier::{Frontier, Offer};
use super::pipeline::{Pipeline, RecordTarget};
use super::RunMode;
use crate::cache::PdfCache;
use crate::config::CompiledConfig;
use crate::output::{CrawlStats, StatsRecorder};
use crate::url::UrlFilter;
use crate::{QuarryError, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use url::Url;

/// Pages between two progress log lines
const PROGRESS_INTERVAL: u64 = 50;

/// Main crawler coordinator structure
pub struct Coordinator<F: Fetcher> {
    pipeline: Arc<Pipeline<F>>,
    workers: usize,
    started: Instant,
}

impl<F: Fetcher> Coordinator<F> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The compiled crawl configuration
    /// * `fetcher` - Source of pages
    /// * `target` - Where records are written
    /// * `mode` - Crawl follows links through the URL filter; test mode
    ///   processes only the seed, which bypasses the filter
    pub fn new(config: CompiledConfig, fetcher: F, target: RecordTarget, mode: &RunMode) -> Self {
        let (filter, follow_links, workers) = match mode {
            RunMode::Crawl => (config.filter.clone(), true, config.config.request.workers),
            RunMode::Test { .. } => (UrlFilter::allow_all(), false, 1),
        };

        let frontier = Frontier::new(config.limits.clone(), filter);
        let pdf_cache = PdfCache::new(&config.config.cache.pdf_dir);

        Self {
            pipeline: Arc::new(Pipeline {
                config,
                fetcher,
                frontier,
                pdf_cache,
                target,
                stats: StatsRecorder::new(),
                follow_links,
            }),
            workers: workers.max(1),
            started: Instant::now(),
        }
    }

    /// Runs the crawl until the frontier is drained or a fatal error occurs
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStats)` - Crawl completed
    /// * `Err(QuarryError)` - The first fatal error; remaining work was abandoned
    pub async fn run(self, seed: Url) -> Result<CrawlStats> {
        self.log_limits();

        match self.pipeline.frontier.offer(seed.clone(), 0) {
            Offer::Queued => tracing::info!("Starting crawl at {}", seed),
            Offer::Filtered => {
                tracing::warn!("Start URL {} is rejected by the URL filters; nothing to crawl", seed)
            }
            Offer::Seen | Offer::Closed => {}
        }

        let mut workers = JoinSet::new();
        for id in 0..self.workers {
            let pipeline = Arc::clone(&self.pipeline);
            workers.spawn(async move { worker(pipeline, id).await });
        }

        let mut failure: Option<QuarryError> = None;
        while let Some(joined) = workers.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => Ok(()),
                Err(e) => Err(QuarryError::Worker(e.to_string())),
            };

            if let Err(e) = result {
                if failure.is_none() {
                    tracing::error!("Stopping crawl: {}", e);
                    self.pipeline.frontier.close();
                    workers.abort_all();
                    failure = Some(e);
                } else {
                    tracing::debug!("Further error after stop: {}", e);
                }
            }
        }

        let stats = self.pipeline.stats.snapshot(self.started.elapsed());
        tracing::info!(
            "Crawl finished: {} pages dispatched, {} records written, {} fetch failures in {:?}",
            stats.dispatched,
            stats.emitted,
            stats.fetch_failures,
            stats.elapsed
        );

        match failure {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    fn log_limits(&self) {
        let limits = self.pipeline.frontier.limits();
        for rule in limits.rules() {
            tracing::info!("Rate limit: {}", rule);
        }
        tracing::info!("Rate limit for unmatched hosts: {}", limits.default_rule());
        tracing::debug!("Running {} workers", self.workers);
    }
}

/// Pulls URLs from the frontier until it is drained or closed
async fn worker<F: Fetcher>(pipeline: Arc<Pipeline<F>>, id: usize) -> Result<()> {
    tracing::trace!("Worker {} started", id);

    while let Some(dispatch) = pipeline.frontier.next().await {
        let dispatched = pipeline.stats.record_dispatch();
        pipeline.process(&dispatch.entry).await?;
        drop(dispatch);

        // Progress reporting every 50 pages
        if dispatched % PROGRESS_INTERVAL == 0 {
            let stats = pipeline.stats.snapshot(std::time::Duration::ZERO);
            tracing::info!(
                "Progress: {} pages dispatched, {} records written, {} in frontier, {} in flight",
                stats.dispatched,
                stats.emitted,
                pipeline.frontier.pending(),
                pipeline.frontier.in_flight()
            );
        }
    }

    tracing::trace!("Worker {} finished", id);
    Ok(())
}
