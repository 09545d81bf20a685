//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with the configured user agent
//! - HEAD probes for binary documents when binary crawling is off
//! - Size-capped GET requests
//! - Content classification and routing to extraction
//! - Canonical resolution of the page's effective URL
//! - Error classification into page outcomes

use super::frontier::CrawlTarget;
use super::parser::{parse_html, resolve_link, ExtractedLink, PageMetadata};
use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::extract::{classify_content, ContentKind, DocumentProcessor};
use crate::relevance::score_document;
use crate::state::PageOutcome;
use crate::url::is_domain_allowed;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, Response};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Path extensions that trigger a HEAD probe when binary crawling is off
const BINARY_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx"];

const X_ROBOTS_TAG: &str = "x-robots-tag";

/// Result of one fetch attempt
///
/// Failures are results too: `success` is false, `outcome` says why, and
/// `error_message` carries the details.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    /// URL as scheduled
    pub url: String,

    /// Identity after redirects and canonical resolution
    pub effective_url: String,

    pub success: bool,

    /// HTTP status, if a response was received
    pub status_code: Option<u16>,

    pub title: Option<String>,

    /// Extracted text
    pub content: Option<String>,

    /// Legal relevance in `[0.0, 1.0]`; 0 for failures
    pub legal_score: f64,

    /// Links found on the page, in document order
    pub discovered_urls: Vec<String>,

    pub metadata: PageMetadata,

    pub error_message: Option<String>,

    pub outcome: PageOutcome,

    /// Depth the page was discovered at
    pub depth: u32,

    pub fetched_at: DateTime<Utc>,
}

impl PageResult {
    pub(crate) fn failure(
        target: &CrawlTarget,
        outcome: PageOutcome,
        status_code: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            url: target.url.to_string(),
            effective_url: target.url.to_string(),
            success: false,
            status_code,
            title: None,
            content: None,
            legal_score: 0.0,
            discovered_urls: Vec::new(),
            metadata: PageMetadata::default(),
            error_message: Some(message.into()),
            outcome,
            depth: target.discovered_depth,
            fetched_at: Utc::now(),
        }
    }
}

/// A page result plus the links the frontier needs to schedule
#[derive(Debug, Clone)]
pub struct PageFetch {
    pub result: PageResult,
    pub links: Vec<ExtractedLink>,
}

impl PageFetch {
    fn failed(result: PageResult) -> Self {
        Self {
            result,
            links: Vec::new(),
        }
    }
}

/// Builds the HTTP client shared by all workers
///
/// # Example
///
/// ```
/// use legal_scout::config::{CrawlerConfig, UserAgentConfig};
/// use legal_scout::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    config: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    let timeout = config.request_timeout();

    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Picks the URL a fetched page is identified by
///
/// A canonical URL in `metadata` replaces `original_url` when it passes the
/// domain rule (allowed domains included). A relative canonical is resolved
/// against the origin of `original_url` first. Open Graph and JSON-LD URLs
/// are never used here.
pub fn choose_effective_url(
    original_url: &Url,
    metadata: &PageMetadata,
    config: &CrawlerConfig,
) -> Url {
    let Some(raw) = metadata.canonical_url.as_deref() else {
        return original_url.clone();
    };

    let origin = original_url
        .join("/")
        .unwrap_or_else(|_| original_url.clone());

    match resolve_link(raw, &origin) {
        Some(canonical) if is_domain_allowed(config, &canonical, original_url) => canonical,
        Some(canonical) => {
            debug!(
                "Ignoring canonical {} of {}: outside allowed domains",
                canonical, original_url
            );
            original_url.clone()
        }
        None => original_url.clone(),
    }
}

/// Fetches pages and turns responses into [`PageResult`]s
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    config: Arc<CrawlerConfig>,
    processor: Arc<DocumentProcessor>,
}

impl Fetcher {
    pub fn new(client: Client, config: Arc<CrawlerConfig>, processor: Arc<DocumentProcessor>) -> Self {
        Self {
            client,
            config,
            processor,
        }
    }

    /// Fetches one target; never fails, failures are encoded in the result
    ///
    /// # Request Flow
    ///
    /// 1. With binary crawling off and a `.pdf`/`.doc`/`.docx` path, send a
    ///    HEAD request; a binary content type ends the fetch as skipped
    /// 2. GET the URL, following up to 10 redirects
    /// 3. Non-2xx → `HttpError`; transport failure → `Unreachable`
    /// 4. Read at most `max_content_bytes` of the body
    /// 5. Classify the body; HTML goes to the link extractor
    /// 6. Extract text and score it
    pub async fn fetch(&self, target: &CrawlTarget) -> PageFetch {
        let filename = last_segment(&target.url);

        if !self.config.enable_binary_crawling && looks_binary(&filename) {
            if let Some(content_type) = self.probe_content_type(&target.url).await {
                if classify_content(&content_type, &filename, b"").is_binary() {
                    debug!("HEAD probe: {} is {}, skipping", target.url, content_type);
                    return PageFetch::failed(binary_skipped(target, &content_type));
                }
            }
        }

        let response = match self.client.get(target.url.as_str()).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to fetch {}: {}", target.url, e);
                return PageFetch::failed(PageResult::failure(
                    target,
                    PageOutcome::Unreachable,
                    None,
                    describe_transport_error(&e),
                ));
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!("{} returned HTTP {}", target.url, status.as_u16());
            return PageFetch::failed(PageResult::failure(
                target,
                PageOutcome::HttpError,
                Some(status.as_u16()),
                format!("HTTP {}", status),
            ));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let content_type = header_str(&headers, CONTENT_TYPE.as_str()).unwrap_or_default();

        let body = match read_body_capped(response, self.config.max_content_bytes).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read body of {}: {}", target.url, e);
                return PageFetch::failed(PageResult::failure(
                    target,
                    PageOutcome::Unreachable,
                    Some(status.as_u16()),
                    format!("Failed to read response body: {}", e),
                ));
            }
        };

        let kind = classify_content(&content_type, &filename, &body);
        let mut result = PageResult::failure(target, PageOutcome::Processed, Some(status.as_u16()), "");
        result.error_message = None;

        if kind.is_binary() && !self.config.enable_binary_crawling {
            return PageFetch::failed(binary_skipped(target, &content_type));
        }
        if kind == ContentKind::Unsupported {
            result.outcome = PageOutcome::UnsupportedContent;
            result.error_message = Some(format!("Unsupported content type: {}", content_type));
            return PageFetch::failed(result);
        }

        let (title, links, mut metadata) = if kind == ContentKind::Html {
            let parsed = parse_html(&String::from_utf8_lossy(&body), &final_url);
            (parsed.title, parsed.links, parsed.metadata)
        } else {
            (None, Vec::new(), PageMetadata::default())
        };

        metadata.content_type = (!content_type.is_empty()).then(|| content_type.clone());
        if let Some(robots_header) = header_str(&headers, X_ROBOTS_TAG) {
            metadata.merge_robots_header(&robots_header);
        }

        let effective_url = choose_effective_url(&final_url, &metadata, &self.config);
        let report = self
            .processor
            .extract_with_report(&body, &filename, &content_type)
            .await;

        result.effective_url = effective_url.to_string();
        result.title = title;
        result.discovered_urls = links.iter().map(|l| l.url.to_string()).collect();

        match report.text {
            Some(text) => {
                result.legal_score =
                    score_document(&text, Some(&effective_url), result.title.as_deref());
                result.content = Some(text);
                result.success = true;
                debug!(
                    "Processed {} ({:?}, score {:.2})",
                    target.url, kind, result.legal_score
                );
            }
            None => {
                result.outcome = PageOutcome::ExtractionFailed;
                result.error_message = Some(format!("Text extraction failed: {}", report.summary()));
                warn!("No text extracted from {}", target.url);
            }
        }
        result.metadata = metadata;

        PageFetch { result, links }
    }

    async fn probe_content_type(&self, url: &Url) -> Option<String> {
        match self.client.head(url.as_str()).send().await {
            Ok(response) if response.status().is_success() => {
                header_str(response.headers(), CONTENT_TYPE.as_str())
            }
            Ok(response) => {
                debug!("HEAD {} returned {}", url, response.status().as_u16());
                None
            }
            Err(e) => {
                debug!("HEAD {} failed: {}", url, e);
                None
            }
        }
    }
}

fn binary_skipped(target: &CrawlTarget, content_type: &str) -> PageResult {
    PageResult::failure(
        target,
        PageOutcome::BinarySkipped,
        None,
        format!("Binary document ({}) skipped: binary crawling is disabled", content_type),
    )
}

/// Reads the body chunk by chunk, stopping once `limit` bytes are buffered
async fn read_body_capped(mut response: Response, limit: usize) -> Result<Vec<u8>, reqwest::Error> {
    let mut body = Vec::new();

    while let Some(chunk) = response.chunk().await? {
        let room = limit.saturating_sub(body.len());
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            debug!("Body of {} truncated at {} bytes", response.url(), limit);
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else if e.is_redirect() {
        format!("Redirect error: {}", e)
    } else {
        e.to_string()
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
}

fn last_segment(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("")
        .to_string()
}

fn looks_binary(filename: &str) -> bool {
    let lowered = filename.to_ascii_lowercase();
    BINARY_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::BinaryExtractor;
    use async_trait::async_trait;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn canonical(href: &str) -> PageMetadata {
        PageMetadata {
            canonical_url: Some(href.to_string()),
            ..PageMetadata::default()
        }
    }

    #[test]
    fn test_effective_url_without_canonical() {
        let original = url("https://example.com/privacy?ref=footer");
        let effective =
            choose_effective_url(&original, &PageMetadata::default(), &CrawlerConfig::default());
        assert_eq!(effective, original);
    }

    #[test]
    fn test_relative_canonical_resolved_against_origin() {
        let original = url("https://example.com/some/deep/page?x=1");
        let effective = choose_effective_url(
            &original,
            &canonical("/legal/privacy"),
            &CrawlerConfig::default(),
        );
        assert_eq!(effective.as_str(), "https://example.com/legal/privacy");
    }

    #[test]
    fn test_canonical_on_disallowed_domain_ignored() {
        let original = url("https://example.com/privacy");
        let effective = choose_effective_url(
            &original,
            &canonical("https://mirror.other.net/privacy"),
            &CrawlerConfig::default(),
        );
        assert_eq!(effective, original);
    }

    #[test]
    fn test_canonical_on_allowed_external_domain_accepted() {
        let config = CrawlerConfig {
            allowed_domains: Some(vec!["example.com".to_string(), "legal-hub.io".to_string()]),
            ..CrawlerConfig::default()
        };
        let original = url("https://example.com/privacy");
        let effective = choose_effective_url(
            &original,
            &canonical("https://docs.legal-hub.io/example/privacy"),
            &config,
        );
        assert_eq!(effective.as_str(), "https://docs.legal-hub.io/example/privacy");
    }

    #[test]
    fn test_open_graph_url_not_used_for_identity() {
        let original = url("https://example.com/privacy");
        let metadata = PageMetadata {
            og_url: Some("https://example.com/og-privacy".to_string()),
            json_ld_url: Some("https://example.com/ld-privacy".to_string()),
            ..PageMetadata::default()
        };
        assert_eq!(
            choose_effective_url(&original, &metadata, &CrawlerConfig::default()),
            original
        );
    }

    struct FixedExtractor(&'static str);

    #[async_trait]
    impl BinaryExtractor for FixedExtractor {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn extract(&self, _bytes: &[u8], _filename: &str) -> Result<String, String> {
            Ok(self.0.to_string())
        }
    }

    fn fetcher(config: CrawlerConfig, extractors: Vec<Box<dyn BinaryExtractor>>) -> Fetcher {
        let config = Arc::new(config);
        let client = build_http_client(&UserAgentConfig::default(), &config).unwrap();
        Fetcher::new(
            client,
            config,
            Arc::new(DocumentProcessor::with_extractors(extractors, 10)),
        )
    }

    fn target(s: &str) -> CrawlTarget {
        CrawlTarget {
            url: url(s),
            discovered_depth: 1,
            discovered_from: None,
            priority_hint: 0.0,
        }
    }

    const PRIVACY_HTML: &str = r#"<html><head>
        <title>Privacy Policy</title>
        <link rel="canonical" href="/privacy">
    </head><body>
        <h1>Privacy Policy</h1>
        <p>This privacy policy describes how we collect personal data.</p>
        <a href="/terms">Terms of Service</a>
    </body></html>"#;

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/privacy"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(PRIVACY_HTML, "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let page = fetcher(CrawlerConfig::default(), Vec::new())
            .fetch(&target(&format!("{}/privacy?utm_source=x", server.uri())))
            .await;
        let result = page.result;

        assert!(result.success);
        assert_eq!(result.outcome, PageOutcome::Processed);
        assert_eq!(result.status_code, Some(200));
        assert_eq!(result.title.as_deref(), Some("Privacy Policy"));
        assert_eq!(result.effective_url, format!("{}/privacy", server.uri()));
        assert!(result.content.unwrap().contains("collect personal data"));
        assert!(result.legal_score > 0.3);
        assert_eq!(result.depth, 1);
        assert_eq!(
            result.metadata.content_type.as_deref(),
            Some("text/html;charset=utf-8")
        );
        assert!(result
            .discovered_urls
            .contains(&format!("{}/terms", server.uri())));
        assert_eq!(page.links.len(), result.discovered_urls.len());
    }

    #[tokio::test]
    async fn test_http_error_is_recorded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = fetcher(CrawlerConfig::default(), Vec::new())
            .fetch(&target(&format!("{}/missing", server.uri())))
            .await
            .result;

        assert!(!result.success);
        assert_eq!(result.outcome, PageOutcome::HttpError);
        assert_eq!(result.status_code, Some(404));
        assert!(result.error_message.unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let result = fetcher(CrawlerConfig::default(), Vec::new())
            .fetch(&target("http://127.0.0.1:1/privacy"))
            .await
            .result;

        assert!(!result.success);
        assert_eq!(result.outcome, PageOutcome::Unreachable);
        assert_eq!(result.status_code, None);
        assert!(result.error_message.is_some());
    }

    #[tokio::test]
    async fn test_binary_disabled_uses_head_probe() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/dpa.pdf"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/dpa.pdf"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = CrawlerConfig {
            enable_binary_crawling: false,
            ..CrawlerConfig::default()
        };
        let result = fetcher(config, Vec::new())
            .fetch(&target(&format!("{}/dpa.pdf", server.uri())))
            .await
            .result;

        assert!(!result.success);
        assert_eq!(result.outcome, PageOutcome::BinarySkipped);
        assert!(result.error_message.unwrap().contains("binary crawling is disabled"));
    }

    #[tokio::test]
    async fn test_binary_disabled_without_extension_hint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(b"%PDF-1.7\n".to_vec()),
            )
            .mount(&server)
            .await;

        let config = CrawlerConfig {
            enable_binary_crawling: false,
            ..CrawlerConfig::default()
        };
        let result = fetcher(config, vec![Box::new(FixedExtractor("should not run at all"))])
            .fetch(&target(&format!("{}/download", server.uri())))
            .await
            .result;

        assert_eq!(result.outcome, PageOutcome::BinarySkipped);
        assert_eq!(result.content, None);
    }

    #[tokio::test]
    async fn test_binary_enabled_extracts_pdf() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/legal/dpa.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(b"%PDF-1.7\n...".to_vec()),
            )
            .mount(&server)
            .await;

        let extractors: Vec<Box<dyn BinaryExtractor>> = vec![Box::new(FixedExtractor(
            "Data Processing Agreement. The processor handles personal data on behalf of the controller.",
        ))];
        let result = fetcher(CrawlerConfig::default(), extractors)
            .fetch(&target(&format!("{}/legal/dpa.pdf", server.uri())))
            .await
            .result;

        assert!(result.success);
        assert!(result.content.unwrap().starts_with("Data Processing Agreement"));
        assert!(result.discovered_urls.is_empty());
        assert!(result.legal_score > 0.0);
    }

    #[tokio::test]
    async fn test_pdf_extraction_failure_recorded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(b"%PDF-1.7\n".to_vec()),
            )
            .mount(&server)
            .await;

        let result = fetcher(CrawlerConfig::default(), vec![Box::new(FixedExtractor(""))])
            .fetch(&target(&format!("{}/scan.pdf", server.uri())))
            .await
            .result;

        assert!(!result.success);
        assert_eq!(result.outcome, PageOutcome::ExtractionFailed);
        assert!(result.error_message.unwrap().contains("fixed: no text"));
    }

    #[tokio::test]
    async fn test_unsupported_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("{}", "application/json"),
            )
            .mount(&server)
            .await;

        let result = fetcher(CrawlerConfig::default(), Vec::new())
            .fetch(&target(&format!("{}/api/config", server.uri())))
            .await
            .result;

        assert_eq!(result.outcome, PageOutcome::UnsupportedContent);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_x_robots_tag_merged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-robots-tag", "nofollow")
                    .set_body_raw(PRIVACY_HTML, "text/html"),
            )
            .mount(&server)
            .await;

        let result = fetcher(CrawlerConfig::default(), Vec::new())
            .fetch(&target(&format!("{}/privacy", server.uri())))
            .await
            .result;

        assert!(result.metadata.is_nofollow());
    }

    #[tokio::test]
    async fn test_body_is_capped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("a".repeat(10_000), "text/plain"),
            )
            .mount(&server)
            .await;

        let config = CrawlerConfig {
            max_content_bytes: 1_000,
            ..CrawlerConfig::default()
        };
        let result = fetcher(config, Vec::new())
            .fetch(&target(&format!("{}/notice.txt", server.uri())))
            .await
            .result;

        assert!(result.success);
        assert_eq!(result.content.unwrap().len(), 1_000);
    }
}
