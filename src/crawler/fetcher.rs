//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - GET requests with `Accept: */*`
//! - Serving and populating the on-disk response cache
//! - Classifying content as HTML or PDF
//! - Error classification

use crate::cache::ResponseCache;
use crate::template::{RequestInfo, ResponseInfo};
use chrono::Utc;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::Client;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// User agent sent when the configuration does not set one
pub const DEFAULT_USER_AGENT: &str = concat!("quarry/", env!("CARGO_PKG_VERSION"));

/// Longest body prefix kept on an HTTP error
const ERROR_BODY_PREFIX: usize = 512;

/// How a fetched body is processed
///
/// Decided from the URL path extension, never from the Content-Type header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Pdf,
}

impl ContentKind {
    /// Classifies a URL: a path ending in `.pdf` (any case) is a PDF
    pub fn from_url(url: &Url) -> Self {
        let path = url.path();
        let is_pdf = path.len() >= 4
            && path
                .get(path.len() - 4..)
                .is_some_and(|ext| ext.eq_ignore_ascii_case(".pdf"));
        if is_pdf {
            Self::Pdf
        } else {
            Self::Html
        }
    }
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,

    /// The request as exposed to templates
    pub request: RequestInfo,

    /// Status and headers as exposed to templates
    pub response: ResponseInfo,

    pub body: Vec<u8>,

    pub kind: ContentKind,

    /// Whether the body came from the response cache
    pub from_cache: bool,
}

impl FetchedPage {
    /// Decodes the body as text
    ///
    /// Uses the charset of the `Content-Type` header, then a byte order mark,
    /// then UTF-8. Malformed sequences become U+FFFD.
    pub fn text(&self) -> String {
        let encoding = self
            .response
            .headers
            .get("content-type")
            .and_then(|value| charset_param(value))
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        let (text, _, _) = encoding.decode(&self.body);
        text.into_owned()
    }
}

/// Extracts the `charset` parameter of a media type
fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success(FetchedPage),

    /// The server answered with a non-2xx status
    HttpError {
        url: Url,
        status: u16,
        headers: BTreeMap<String, String>,
        /// Start of the response body, lossily decoded
        body_prefix: String,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        url: Url,
        /// Error description
        error: String,
    },
}

/// Retrieves pages for the pipeline
///
/// Implemented by [`HttpFetcher`] for real crawls; tests provide canned
/// responses.
pub trait Fetcher: Send + Sync + 'static {
    /// Fetches `url`, discovered at link distance `depth`
    fn fetch(&self, url: &Url, depth: u32) -> impl Future<Output = FetchResult> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Sent with every request; the built-in default when empty
/// * `timeout` - Total time allowed per request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(effective_user_agent(user_agent))
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

fn effective_user_agent(user_agent: &str) -> &str {
    if user_agent.is_empty() {
        DEFAULT_USER_AGENT
    } else {
        user_agent
    }
}

/// Flattens a header map; repeated headers are joined with `", "`
fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        map.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    map
}

/// Fetches pages over HTTP, optionally through the response cache
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
    cache: Option<ResponseCache>,
}

impl HttpFetcher {
    /// Creates a fetcher
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Configured user agent (empty for the default)
    /// * `timeout` - Per-request timeout
    /// * `cache` - Response cache to consult and populate, if any
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        cache: Option<ResponseCache>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent, timeout)?,
            user_agent: effective_user_agent(user_agent).to_string(),
            cache,
        })
    }

    fn request_headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert("accept".to_string(), "*/*".to_string());
        headers.insert("user-agent".to_string(), self.user_agent.clone());
        headers
    }

    async fn fetch_cached(&self, url: &Url, depth: u32) -> Option<FetchedPage> {
        let cache = self.cache.as_ref()?;
        match cache.load(url).await {
            Ok(Some(cached)) => {
                let age = Utc::now().signed_duration_since(cached.fetched_at);
                tracing::debug!(
                    age_secs = age.num_seconds(),
                    "Cache hit for {} (fetched {})",
                    url,
                    cached.fetched_at.to_rfc3339()
                );
                Some(FetchedPage {
                    request: RequestInfo::get(&cached.final_url, self.request_headers(), depth),
                    kind: ContentKind::from_url(&cached.final_url),
                    url: cached.final_url,
                    response: cached.response,
                    body: cached.body,
                    from_cache: true,
                })
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Response cache read failed for {}: {}", url, e);
                None
            }
        }
    }

    async fn fetch_network(&self, url: &Url, depth: u32) -> FetchResult {
        let response = match self.client.get(url.clone()).header(ACCEPT, "*/*").send().await {
            Ok(response) => response,
            Err(e) => return network_error(url, e),
        };

        let status = response.status();
        let final_url = response.url().clone();
        let headers = header_map(response.headers());

        let body = match response.bytes().await {
            Ok(body) => body.to_vec(),
            Err(e) => return network_error(url, e),
        };

        if !status.is_success() {
            let end = body.len().min(ERROR_BODY_PREFIX);
            return FetchResult::HttpError {
                url: final_url,
                status: status.as_u16(),
                headers,
                body_prefix: String::from_utf8_lossy(&body[..end]).into_owned(),
            };
        }

        let response = ResponseInfo {
            status: status.as_u16(),
            headers,
        };

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(url, &final_url, &response, &body).await {
                tracing::warn!("Response cache write failed for {}: {}", url, e);
            }
        }

        FetchResult::Success(FetchedPage {
            request: RequestInfo::get(&final_url, self.request_headers(), depth),
            kind: ContentKind::from_url(&final_url),
            url: final_url,
            response,
            body,
            from_cache: false,
        })
    }
}

impl Fetcher for HttpFetcher {
    /// Fetches a URL
    ///
    /// # Request Flow
    ///
    /// 1. Serve from the response cache when an entry exists
    /// 2. Send a GET request (redirects followed)
    /// 3. Non-2xx → `HttpError`; transport failure → `NetworkError`
    /// 4. Store 2xx responses in the cache
    ///
    /// Failed fetches are never retried.
    async fn fetch(&self, url: &Url, depth: u32) -> FetchResult {
        if let Some(page) = self.fetch_cached(url, depth).await {
            return FetchResult::Success(page);
        }
        self.fetch_network(url, depth).await
    }
}

fn network_error(url: &Url, e: reqwest::Error) -> FetchResult {
    // Classify error
    let error = if e.is_timeout() {
        format!("Request timeout: {}", e)
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else if e.is_redirect() {
        format!("Redirect error: {}", e)
    } else {
        e.to_string()
    };

    FetchResult::NetworkError {
        url: url.clone(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client("TestCrawler/1.0", Duration::from_secs(5)).is_ok());
        assert!(build_http_client("", Duration::from_millis(100)).is_ok());
    }

    #[test]
    fn test_default_user_agent() {
        assert!(DEFAULT_USER_AGENT.starts_with("quarry/"));
        assert_eq!(effective_user_agent(""), DEFAULT_USER_AGENT);
        assert_eq!(effective_user_agent("Bot/2"), "Bot/2");
    }

    #[test]
    fn test_content_kind_from_url() {
        let kind = |s: &str| ContentKind::from_url(&Url::parse(s).unwrap());

        assert_eq!(kind("https://example.com/report.pdf"), ContentKind::Pdf);
        assert_eq!(kind("https://example.com/REPORT.PDF?download=1"), ContentKind::Pdf);
        assert_eq!(kind("https://example.com/report.pdf.html"), ContentKind::Html);
        assert_eq!(kind("https://example.com/pdf"), ContentKind::Html);
        assert_eq!(kind("https://example.com/"), ContentKind::Html);
    }

    fn page(content_type: Option<&str>, body: &[u8]) -> FetchedPage {
        let url = Url::parse("https://example.com/").unwrap();
        let mut headers = BTreeMap::new();
        if let Some(value) = content_type {
            headers.insert("content-type".to_string(), value.to_string());
        }
        FetchedPage {
            request: RequestInfo::get(&url, BTreeMap::new(), 0),
            kind: ContentKind::Html,
            url,
            response: ResponseInfo {
                status: 200,
                headers,
            },
            body: body.to_vec(),
            from_cache: false,
        }
    }

    #[test]
    fn test_text_honours_declared_charset() {
        let latin1 = page(Some("text/html; charset=iso-8859-1"), b"<h1>Caf\xE9</h1>");
        assert_eq!(latin1.text(), "<h1>Caf\u{e9}</h1>");

        let quoted = page(Some("text/html; Charset=\"windows-1252\""), b"\x93quoted\x94");
        assert_eq!(quoted.text(), "\u{201c}quoted\u{201d}");

        let utf8 = page(Some("text/html"), "Café".as_bytes());
        assert_eq!(utf8.text(), "Café");

        let unknown = page(Some("text/html; charset=no-such-charset"), "Café".as_bytes());
        assert_eq!(unknown.text(), "Café");

        assert_eq!(page(None, b"Caf\xE9").text(), "Caf\u{fffd}");
    }

    #[test]
    fn test_charset_param() {
        assert_eq!(charset_param("text/html; charset=UTF-8"), Some("UTF-8"));
        assert_eq!(charset_param("text/html;charset=\"latin1\""), Some("latin1"));
        assert_eq!(charset_param("text/html"), None);
        assert_eq!(charset_param("charset=utf-8"), None);
    }

    #[tokio::test]
    async fn test_fetch_served_from_cache() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path());
        let url = Url::parse("http://127.0.0.1:9/never-contacted").unwrap();
        let cached = page(Some("text/html; charset=iso-8859-1"), b"Caf\xE9");
        cache
            .store(&url, &url, &cached.response, &cached.body)
            .await
            .unwrap();

        let fetcher = HttpFetcher::new("", Duration::from_millis(100), Some(cache)).unwrap();
        match fetcher.fetch(&url, 2).await {
            FetchResult::Success(page) => {
                assert!(page.from_cache);
                assert_eq!(page.request.depth, 2);
                assert_eq!(page.text(), "Caf\u{e9}");
            }
            other => panic!("expected a cached page, got {:?}", other),
        }
    }

    #[test]
    fn test_header_map_joins_repeats() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", "a=1".parse().unwrap());
        headers.append("set-cookie", "b=2".parse().unwrap());
        headers.insert("content-type", "text/html".parse().unwrap());

        let map = header_map(&headers);
        assert_eq!(map["set-cookie"], "a=1, b=2");
        assert_eq!(map["content-type"], "text/html");
    }
}
