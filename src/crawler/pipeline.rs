//! Per-page processing: fetch, classify, extract, render, emit, enqueue

use super::fetcher::{ContentKind, FetchResult, FetchedPage, Fetcher};
use super::frontier::{Frontier, RedirectClaim};
use crate::cache::PdfCache;
use crate::config::CompiledConfig;
use crate::extract::html::discover_links;
use crate::extract::{pdf, ExtractedDocument, PdfContent};
use crate::output::{OutputError, OutputSink, StatsRecorder};
use crate::state::FrontierEntry;
use crate::template::TemplateContext;
use crate::Result;
use scraper::Html;
use std::collections::BTreeMap;

/// Where extracted records go
#[derive(Debug, Clone)]
pub enum RecordTarget {
    /// The newline-delimited output file
    Sink(OutputSink),

    /// Pretty-printed JSON on stdout (test mode)
    Stdout,
}

impl RecordTarget {
    async fn emit(&self, document: &ExtractedDocument) -> Result<()> {
        match self {
            Self::Sink(sink) => sink.emit(document).await?,
            Self::Stdout => {
                let json = serde_json::to_string_pretty(document).map_err(OutputError::from)?;
                println!("{}", json);
            }
        }
        Ok(())
    }
}

/// Everything a worker needs to process a dispatched URL
pub struct Pipeline<F: Fetcher> {
    pub(crate) config: CompiledConfig,
    pub(crate) fetcher: F,
    pub(crate) frontier: Frontier,
    pub(crate) pdf_cache: PdfCache,
    pub(crate) target: RecordTarget,
    pub(crate) stats: StatsRecorder,
    /// Whether links found on HTML pages are offered to the frontier
    pub(crate) follow_links: bool,
}

impl<F: Fetcher> Pipeline<F> {
    /// Processes one dispatched URL
    ///
    /// Fetch failures are logged and counted; they do not fail the run. A
    /// redirect to a filtered or already claimed URL is skipped.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The page was processed, skipped or failed recoverably
    /// * `Err(QuarryError)` - A fatal error; the crawl must stop
    pub async fn process(&self, entry: &FrontierEntry) -> Result<()> {
        tracing::debug!("Processing URL: {} (depth {})", entry.url, entry.depth);

        let page = match self.fetcher.fetch(&entry.url, entry.depth).await {
            FetchResult::Success(page) => page,
            FetchResult::HttpError {
                url,
                status,
                headers,
                body_prefix,
            } => {
                tracing::warn!(
                    %url,
                    status,
                    ?headers,
                    body = %body_prefix,
                    "Request failed with HTTP status {}",
                    status
                );
                self.stats.record_fetch_failure();
                return Ok(());
            }
            FetchResult::NetworkError { url, error } => {
                tracing::warn!(%url, "Request failed: {}", error);
                self.stats.record_fetch_failure();
                return Ok(());
            }
        };

        if page.from_cache {
            self.stats.record_cache_hit();
        }

        match self.frontier.claim_redirect(entry, &page.url) {
            RedirectClaim::Unchanged | RedirectClaim::Claimed => {}
            RedirectClaim::Filtered => {
                tracing::debug!("{} redirected to filtered URL {}", entry.url, page.url);
                self.stats.record_skipped();
                return Ok(());
            }
            RedirectClaim::Seen => {
                tracing::debug!("{} redirected to already seen URL {}", entry.url, page.url);
                self.stats.record_skipped();
                return Ok(());
            }
        }

        match page.kind {
            ContentKind::Html => self.process_html(page, entry.depth).await,
            ContentKind::Pdf => self.process_pdf(page).await,
        }
    }

    async fn process_html(&self, page: FetchedPage, depth: u32) -> Result<()> {
        // The parsed document is not Send; keep it out of any await
        let (record, links) = {
            let document = Html::parse_document(&page.text());
            let empty = BTreeMap::new();
            let context = TemplateContext::html(&page.request, Some(&page.response), &empty);

            let record = self.config.html_fields.evaluate(
                Some(&document),
                &self.config.templates,
                &context,
            )?;
            let links = if self.follow_links {
                discover_links(&document, &page.url)
            } else {
                Vec::new()
            };
            (record, links)
        };

        self.emit(&record).await?;

        if !links.is_empty() {
            let found = links.len();
            let queued = self.frontier.offer_all(links, depth + 1);
            tracing::debug!("{}: {} links, {} new", page.url, found, queued);
        }

        Ok(())
    }

    async fn process_pdf(&self, page: FetchedPage) -> Result<()> {
        if !self.config.pdf_enabled() {
            tracing::debug!("Skipping PDF {}: PDF extraction is disabled", page.url);
            self.stats.record_skipped();
            return Ok(());
        }

        let (path, bytes) = self.pdf_cache.store(&page.url, &page.body).await?;

        let content = match pdf::extract(bytes).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    url = %page.url,
                    path = %path.display(),
                    "PDF could not be parsed: {}",
                    e
                );
                self.stats.record_pdf_failure();
                PdfContent::unparsed()
            }
        };

        let context = TemplateContext::pdf(
            &page.request,
            Some(&page.response),
            &content.text,
            &content.meta,
        );
        let record = self
            .config
            .pdf_fields
            .evaluate(None, &self.config.templates, &context)?;

        self.emit(&record).await
    }

    async fn emit(&self, record: &ExtractedDocument) -> Result<()> {
        self.target.emit(record).await?;
        self.stats.record_emitted();
        Ok(())
    }
}
