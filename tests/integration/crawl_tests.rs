//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use quarry::config::{load_config_str, CompiledConfig, Config, ConfigFormat};
use quarry::crawler::{crawl, RunMode};
use quarry::{ExtractedDocument, QuarryError};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration rooted at the mock server
///
/// Output and caches live in `dir`; `patch` is merged over the defaults.
fn create_test_config(base_url: &str, dir: &Path, patch: Value) -> CompiledConfig {
    let mut config = json!({
        "userAgent": "TestBot/1.0",
        "request": {"timeoutInMs": 2000, "workers": 4},
        "input": {"startUrl": format!("{}/", base_url)},
        "output": {"filename": dir.join("out.jsonl")},
        "cache": {
            "responses": false,
            "responseDir": dir.join("cache"),
            "pdfDir": dir.join("pdf-cache"),
        },
        "html": {"selectors": {
            "title": "h1",
            "url": "{{ request.url }}",
            "status": "{{ response.status }}",
        }},
    });
    merge(&mut config, patch);

    serde_json::from_value::<Config>(config)
        .expect("Invalid test config")
        .compile()
        .expect("Failed to compile test config")
}

fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, patch) => *base = patch,
    }
}

fn read_records(path: &Path) -> Vec<ExtractedDocument> {
    std::fs::read_to_string(path)
        .expect("Output file missing")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Invalid JSON line"))
        .collect()
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body).into_bytes(),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Mounts `/`, `/page1`, `/page2`, where each page links to the others
async fn mount_small_site(server: &MockServer) {
    let nav = r#"<a href="/">Home</a> <a href="/page1">One</a> <a href="page2#top">Two</a>"#;
    mount_page(server, "/", &format!("<h1>Home</h1>{}", nav)).await;
    mount_page(server, "/page1", &format!("<h1>Page 1</h1>{}", nav)).await;
    mount_page(server, "/page2", &format!("<h1>Page 2</h1>{}", nav)).await;
}

fn output_path(dir: &TempDir) -> PathBuf {
    dir.path().join("out.jsonl")
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path(), json!({}));

    let stats = crawl(config, RunMode::Crawl).await.expect("Crawl failed");

    let records = read_records(&output_path(&dir));
    assert_eq!(records.len(), 3, "One record per page");
    assert_eq!(stats.emitted, 3);
    assert_eq!(stats.dispatched, 3);

    let mut titles: Vec<&str> = records.iter().map(|r| r["title"].as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["Home", "Page 1", "Page 2"]);

    let page2 = records.iter().find(|r| r["title"] == "Page 2").unwrap();
    assert_eq!(page2["url"], format!("{}/page2", mock_server.uri()));
    assert_eq!(page2["status"], "200");
}

#[tokio::test]
async fn test_records_have_sorted_keys() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "<h1>Only</h1>").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path(), json!({}));
    crawl(config, RunMode::Crawl).await.unwrap();

    let content = std::fs::read_to_string(output_path(&dir)).unwrap();
    let line = content.lines().next().unwrap();
    let status = line.find("\"status\"").unwrap();
    let title = line.find("\"title\"").unwrap();
    let url = line.find("\"url\"").unwrap();
    assert!(status < title && title < url);
}

#[tokio::test]
async fn test_sends_accept_and_user_agent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("accept", "*/*"))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(html("<h1>Checked</h1>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path(), json!({}));
    crawl(config, RunMode::Crawl).await.unwrap();

    let records = read_records(&output_path(&dir));
    assert_eq!(records[0]["title"], "Checked");
}

#[tokio::test]
async fn test_failed_pages_are_skipped() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        r#"<h1>Home</h1><a href="/missing">Gone</a><a href="/broken">Broken</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path(), json!({}));
    let stats = crawl(config, RunMode::Crawl).await.unwrap();

    assert_eq!(read_records(&output_path(&dir)).len(), 1);
    assert_eq!(stats.fetch_failures, 2);
}

#[tokio::test]
async fn test_url_filters() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        r#"<a href="/docs/a">A</a><a href="/docs/private/b">B</a><a href="/blog/c">C</a>"#,
    )
    .await;
    mount_page(&mock_server, "/docs/a", "<h1>A</h1>").await;
    Mock::given(method("GET"))
        .and(path("/docs/private/b"))
        .respond_with(html("<h1>B</h1>"))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blog/c"))
        .respond_with(html("<h1>C</h1>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let base = mock_server.uri();
    let config = create_test_config(
        &base,
        dir.path(),
        json!({"input": {
            "urlFilters": [format!("^{}/$", regex_escape(&base)), "/docs/"],
            "disallowedUrlFilters": ["/private/"],
        }}),
    );
    crawl(config, RunMode::Crawl).await.unwrap();

    let records = read_records(&output_path(&dir));
    let mut titles: Vec<&str> = records.iter().map(|r| r["title"].as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["", "A"]);
}

fn regex_escape(s: &str) -> String {
    s.chars()
        .flat_map(|c| {
            if "\\.+*?()|[]{}^$".contains(c) {
                vec!['\\', c]
            } else {
                vec![c]
            }
        })
        .collect()
}

#[tokio::test]
async fn test_test_mode_fetches_one_url_without_output() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(html(r#"<h1>Article</h1><a href="/other">Other</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/other"))
        .respond_with(html("<h1>Other</h1>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path(), json!({}));
    let mode = RunMode::Test {
        url: format!("{}/article", mock_server.uri()),
    };

    let stats = crawl(config, mode).await.unwrap();

    assert_eq!(stats.dispatched, 1);
    assert_eq!(stats.emitted, 1);
    assert!(!output_path(&dir).exists(), "Test mode must not create the output file");
}

#[tokio::test]
async fn test_response_cache_serves_second_run() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<h1>Cached</h1>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let patch = json!({"cache": {"responses": true}});

    let first = crawl(
        create_test_config(&mock_server.uri(), dir.path(), patch.clone()),
        RunMode::Crawl,
    )
    .await
    .unwrap();
    assert_eq!(first.cache_hits, 0);

    let second = crawl(
        create_test_config(&mock_server.uri(), dir.path(), patch),
        RunMode::Crawl,
    )
    .await
    .unwrap();
    assert_eq!(second.cache_hits, 1);

    let records = read_records(&output_path(&dir));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["title"], "Cached");
    assert_eq!(records[0]["status"], "200");
}

#[tokio::test]
async fn test_unparseable_pdf_emits_sentinel() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        r#"<h1>Reports</h1><a href="/files/Report.PDF">Annual report</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/files/Report.PDF"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"this is not a pdf".to_vec(), "application/pdf"),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &mock_server.uri(),
        dir.path(),
        json!({"pdf": {"enabled": true, "selectors": {
            "text": "{{ text }}",
            "title": "{{ meta.Title | default('untitled') }}",
            "kind": "{{ response.headers['content-type'] }}",
        }}}),
    );

    let stats = crawl(config, RunMode::Crawl).await.unwrap();
    assert_eq!(stats.pdf_failures, 1);

    let records = read_records(&output_path(&dir));
    assert_eq!(records.len(), 2);

    let pdf = records.iter().find(|r| r.contains_key("text")).unwrap();
    assert_eq!(pdf["text"], "PDF could not be parsed");
    assert_eq!(pdf["title"], "untitled");
    assert_eq!(pdf["kind"], "application/pdf");

    let cached = dir.path().join("pdf-cache").join("Report.PDF");
    assert_eq!(std::fs::read(cached).unwrap(), b"this is not a pdf");
}

#[tokio::test]
async fn test_rate_limit_delay_is_respected() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &mock_server.uri(),
        dir.path(),
        json!({"request": {
            "domainGlob": "127.0.0.1*",
            "parellelism": 1,
            "delayInMs": 100,
        }}),
    );

    let started = Instant::now();
    let stats = crawl(config, RunMode::Crawl).await.unwrap();

    assert_eq!(stats.dispatched, 3);
    // Three dispatches in one group are separated by at least two delays
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_template_failure_aborts_crawl() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &mock_server.uri(),
        dir.path(),
        json!({"html": {"selectors": {"bad": "{{ request.url | regex_replace('[', '') }}"}}}),
    );

    let result = crawl(config, RunMode::Crawl).await;
    assert!(matches!(result, Err(QuarryError::Template { .. })));
}

#[tokio::test]
async fn test_unwritable_output_is_fatal() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &mock_server.uri(),
        dir.path(),
        json!({"output": {"filename": dir.path().join("no-such-dir").join("out.jsonl")}}),
    );

    let result = crawl(config, RunMode::Crawl).await;
    assert!(matches!(result, Err(QuarryError::Output(_))));
}

#[test]
fn test_config_with_original_layout_compiles() {
    let config = load_config_str(
        r#"{
            "debug": true,
            "userAgent": "Mozilla/5.0 (compatible; Quarry)",
            "request": {
                "timeoutInMs": 15000,
                "domainGlob": "*example.com*",
                "parellelism": 2,
                "delayInMs": 500,
                "randomDelayInMs": 250
            },
            "input": {
                "startUrl": "https://www.example.com/",
                "urlFilters": ["https://www\\.example\\.com/.*"],
                "disallowedUrlFilters": ["\\.(jpg|png|gif)$"]
            },
            "Output": {"Filename": "records.jsonl"},
            "Html": {"Selectors": {
                "title": "h1, .headline",
                "summary": "{{ request.url | trunc(30) }}"
            }},
            "Pdf": {"Enabled": true, "Selectors": {"body": "{{ text | squish }}"}}
        }"#,
        ConfigFormat::Json,
    )
    .unwrap();

    let compiled = config.compile().unwrap();
    assert_eq!(compiled.html_fields.len(), 2);
    assert_eq!(compiled.pdf_fields.len(), 1);
    assert_eq!(compiled.limits.rules().len(), 1);
    assert!(compiled.filter.allows("https://www.example.com/news"));
    assert!(!compiled.filter.allows("https://www.example.com/logo.png"));
}

#[tokio::test]
async fn test_redirect_to_denied_url_is_not_emitted() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        r#"<h1>Home</h1><a href="/go">Go</a><a href="/old">Old</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/go"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/private/secret"))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/private/secret", "<h1>Secret</h1>").await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &mock_server.uri(),
        dir.path(),
        json!({"input": {"disallowedUrlFilters": ["/private/"]}}),
    );

    let stats = crawl(config, RunMode::Crawl).await.unwrap();

    let records = read_records(&output_path(&dir));
    let titles: Vec<&str> = records.iter().map(|r| r["title"].as_str()).collect();
    assert_eq!(titles, vec!["Home"], "Neither the denied nor the repeated page is emitted");
    assert_eq!(stats.skipped, 2);
}

#[tokio::test]
async fn test_declared_charset_is_decoded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<html><body><h1>Caf\xE9</h1></body></html>".to_vec(),
            "text/html; charset=iso-8859-1",
        ))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &mock_server.uri(),
        dir.path(),
        json!({"cache": {"responses": true}}),
    );
    crawl(config, RunMode::Crawl).await.unwrap();
    let records = read_records(&output_path(&dir));
    assert_eq!(records[0]["title"], "Caf\u{e9}");

    // The cached body keeps its charset
    let config = create_test_config(
        &mock_server.uri(),
        dir.path(),
        json!({"cache": {"responses": true}}),
    );
    let stats = crawl(config, RunMode::Crawl).await.unwrap();
    assert_eq!(stats.cache_hits, 1);
    let records = read_records(&output_path(&dir));
    assert_eq!(records[0]["title"], "Caf\u{e9}");
}
