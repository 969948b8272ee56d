use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Quarry
///
/// Keys follow the camelCase JSON layout of existing crawl configs. Section
/// names are also accepted capitalized (`Output`, `Html`, `Pdf`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Forces debug-level logging for the crawler
    #[serde(default)]
    pub debug: bool,

    /// User agent sent with every request; empty means the built-in default
    #[serde(default)]
    pub user_agent: String,

    #[serde(default)]
    pub request: RequestConfig,

    pub input: InputConfig,

    #[serde(alias = "Output")]
    pub output: OutputConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default, alias = "Html")]
    pub html: FieldsConfig,

    #[serde(default, alias = "Pdf")]
    pub pdf: PdfConfig,
}

/// Request timing, rate limiting and worker pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    /// Per-request timeout (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_in_ms: u64,

    /// Host glob of the single inline limit rule
    #[serde(default)]
    pub domain_glob: Option<String>,

    /// Parallelism of the inline limit rule (0 = unlimited)
    #[serde(default, alias = "parellelism")]
    pub parallelism: usize,

    /// Minimum delay between dispatches of the inline limit rule (milliseconds)
    #[serde(default)]
    pub delay_in_ms: u64,

    /// Upper bound of the random extra delay of the inline limit rule (milliseconds)
    #[serde(default)]
    pub random_delay_in_ms: u64,

    /// Additional limit rules, matched after the inline rule in order
    #[serde(default)]
    pub limits: Vec<LimitConfig>,

    /// Policy for hosts that match no limit rule
    #[serde(default)]
    pub default_limit: DefaultLimitConfig,

    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_in_ms: default_timeout_ms(),
            domain_glob: None,
            parallelism: 0,
            delay_in_ms: 0,
            random_delay_in_ms: 0,
            limits: Vec::new(),
            default_limit: DefaultLimitConfig::default(),
            workers: default_workers(),
        }
    }
}

impl RequestConfig {
    /// Returns every configured limit rule in matching order
    ///
    /// The inline `domainGlob` rule, when present, comes first.
    pub fn limit_rules(&self) -> Vec<LimitConfig> {
        let mut rules = Vec::with_capacity(self.limits.len() + 1);

        if let Some(glob) = self.domain_glob.as_deref().filter(|g| !g.is_empty()) {
            rules.push(LimitConfig {
                domain_glob: glob.to_string(),
                parallelism: self.parallelism,
                delay_in_ms: self.delay_in_ms,
                random_delay_in_ms: self.random_delay_in_ms,
            });
        }

        rules.extend(self.limits.iter().cloned());
        rules
    }
}

/// A rate-limiting rule for hosts matching a glob
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitConfig {
    /// Host glob, e.g. `*.example.com` or `*`
    pub domain_glob: String,

    /// Maximum concurrent requests for the group (0 = unlimited)
    #[serde(default, alias = "parellelism")]
    pub parallelism: usize,

    #[serde(default)]
    pub delay_in_ms: u64,

    #[serde(default)]
    pub random_delay_in_ms: u64,
}

/// Limit applied to hosts that match no rule
///
/// Defaults to unlimited parallelism and no delay, so unmatched hosts are
/// bounded only by the worker pool.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultLimitConfig {
    #[serde(default, alias = "parellelism")]
    pub parallelism: usize,

    #[serde(default)]
    pub delay_in_ms: u64,

    #[serde(default)]
    pub random_delay_in_ms: u64,
}

/// Crawl input configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputConfig {
    /// First URL offered to the frontier
    pub start_url: String,

    /// Allow patterns; empty means every URL is allowed
    #[serde(default)]
    pub url_filters: Vec<String>,

    /// Deny patterns, checked against every URL
    #[serde(default)]
    pub disallowed_url_filters: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the newline-delimited JSON output file
    #[serde(alias = "Filename")]
    pub filename: String,
}

/// On-disk cache locations
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Whether crawl mode reads and writes the response cache
    #[serde(default = "default_true")]
    pub responses: bool,

    #[serde(default = "default_response_dir")]
    pub response_dir: String,

    #[serde(default = "default_pdf_dir")]
    pub pdf_dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            responses: true,
            response_dir: default_response_dir(),
            pdf_dir: default_pdf_dir(),
        }
    }
}

/// Field name to selector-or-template map for HTML pages
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldsConfig {
    #[serde(default, alias = "Selectors")]
    pub selectors: BTreeMap<String, String>,
}

/// PDF extraction configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PdfConfig {
    #[serde(default, alias = "Enabled")]
    pub enabled: bool,

    #[serde(default, alias = "Selectors")]
    pub selectors: BTreeMap<String, String>,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_workers() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_response_dir() -> String {
    "cache".to_string()
}

fn default_pdf_dir() -> String {
    "pdf-cache".to_string()
}
