//! Crawl statistics
//!
//! Workers update a shared [`StatsRecorder`]; the coordinator takes a
//! [`CrawlStats`] snapshot for progress logs and the final summary.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters updated concurrently by the workers
#[derive(Debug, Default)]
pub struct StatsRecorder {
    dispatched: AtomicU64,
    emitted: AtomicU64,
    fetch_failures: AtomicU64,
    pdf_failures: AtomicU64,
    skipped: AtomicU64,
    cache_hits: AtomicU64,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a dispatched URL and returns the new total
    pub fn record_dispatch(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pdf_failure(&self) {
        self.pdf_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a snapshot of the counters
    pub fn snapshot(&self, elapsed: Duration) -> CrawlStats {
        CrawlStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            pdf_failures: self.pdf_failures.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            elapsed,
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CrawlStats {
    /// URLs released by the frontier
    pub dispatched: u64,

    /// Records handed to the output
    pub emitted: u64,

    /// Fetches that ended in a network error or a non-2xx status
    pub fetch_failures: u64,

    /// PDFs that could not be converted (emitted with the sentinel text)
    pub pdf_failures: u64,

    /// Responses not processed, e.g. PDFs while PDF extraction is disabled
    pub skipped: u64,

    /// Responses served from the response cache
    pub cache_hits: u64,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlStats {
    /// Pages per second over the whole run
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.dispatched as f64 / secs
        } else {
            0.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages dispatched: {}", stats.dispatched);
    println!("  Records written: {}", stats.emitted);
    println!("  Served from cache: {}", stats.cache_hits);
    println!("  Duration: {:.1}s ({:.2} pages/sec)", stats.elapsed.as_secs_f64(), stats.rate());
    println!();

    if stats.fetch_failures > 0 || stats.pdf_failures > 0 || stats.skipped > 0 {
        println!("Problems:");
        println!("  Fetch failures: {}", stats.fetch_failures);
        println!("  Unparseable PDFs: {}", stats.pdf_failures);
        println!("  Skipped: {}", stats.skipped);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_snapshot() {
        let recorder = StatsRecorder::new();
        assert_eq!(recorder.record_dispatch(), 1);
        assert_eq!(recorder.record_dispatch(), 2);
        recorder.record_emitted();
        recorder.record_fetch_failure();
        recorder.record_pdf_failure();
        recorder.record_skipped();

        let stats = recorder.snapshot(Duration::from_secs(2));
        assert_eq!(stats.dispatched, 2);
        assert_eq!(stats.emitted, 1);
        assert_eq!(stats.fetch_failures, 1);
        assert_eq!(stats.pdf_failures, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.cache_hits, 0);
        assert!((stats.rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rate_with_zero_elapsed() {
        let stats = CrawlStats::default();
        assert_eq!(stats.rate(), 0.0);
    }

    #[test]
    fn test_concurrent_updates() {
        let recorder = Arc::new(StatsRecorder::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let recorder = Arc::clone(&recorder);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        recorder.record_emitted();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(recorder.snapshot(Duration::ZERO).emitted, 800);
    }
}
