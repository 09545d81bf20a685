use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Legal-Scout
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Order in which the frontier hands out URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStrategy {
    /// Breadth-first (FIFO queue)
    Bfs,
    /// Depth-first (LIFO stack)
    Dfs,
    /// Highest legal relevance first (max-heap)
    #[default]
    Priority,
}

impl std::fmt::Display for CrawlStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bfs => "bfs",
            Self::Dfs => "dfs",
            Self::Priority => "priority",
        };
        f.write_str(name)
    }
}

/// Run-wide crawl policy
///
/// Set once when the crawler is constructed and never mutated during a run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum link depth from a seed (seeds are depth 0)
    pub max_depth: u32,

    /// Maximum number of pages dequeued per run
    pub max_pages: usize,

    /// Frontier ordering
    pub strategy: CrawlStrategy,

    /// Domains that may be crawled; unset means same root domain as the base page
    pub allowed_domains: Option<Vec<String>>,

    /// Accept links to any domain
    pub follow_external_links: bool,

    /// Schedule links carrying `rel="nofollow"`
    pub follow_nofollow: bool,

    /// Successful pages scoring below this are dropped from the results
    pub min_legal_score: f64,

    /// Politeness delay between consecutive fetches, in seconds
    pub delay_between_requests: f64,

    /// Extract text from PDFs and similar binary documents
    pub enable_binary_crawling: bool,

    /// Number of concurrent fetch workers
    pub max_concurrent_requests: usize,

    /// Per-request timeout, in seconds
    pub request_timeout_secs: u64,

    /// Response bodies are truncated at this many bytes
    pub max_content_bytes: usize,

    /// Seed the frontier from robots.txt sitemaps
    pub use_sitemaps: bool,

    /// Upper bound on URLs taken from sitemaps
    pub max_sitemap_urls: usize,

    /// Honor robots.txt Disallow rules and Crawl-delay
    pub respect_robots_txt: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_pages: 50,
            strategy: CrawlStrategy::Priority,
            allowed_domains: None,
            follow_external_links: false,
            follow_nofollow: false,
            min_legal_score: 0.0,
            delay_between_requests: 1.0,
            enable_binary_crawling: true,
            max_concurrent_requests: 4,
            request_timeout_secs: 30,
            max_content_bytes: 10 * 1024 * 1024,
            use_sitemaps: true,
            max_sitemap_urls: 500,
            respect_robots_txt: false,
        }
    }
}

impl CrawlerConfig {
    /// The politeness delay as a [`Duration`]
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_between_requests.max(0.0))
    }

    /// The per-request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Binary extractor preferences
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtractionConfig {
    /// Fall back to the `pdftotext` tool when the built-in PDF parser finds no text
    pub enable_pdftotext: bool,

    /// Path or name of the `pdftotext` executable
    pub pdftotext_path: String,

    /// Remote extraction service tried last (receives the raw bytes via POST)
    pub extraction_service_url: Option<String>,

    /// Extracted text shorter than this is treated as empty
    pub min_text_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            enable_pdftotext: true,
            pdftotext_path: "pdftotext".to_string(),
            extraction_service_url: None,
            min_text_chars: 20,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "LegalScout".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/bot".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite document database
    pub database_path: String,

    /// Where to write the markdown summary, if anywhere
    #[serde(default)]
    pub summary_path: Option<String>,

    /// Where to write the JSON results, if anywhere
    #[serde(default)]
    pub json_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./legal-scout.db".to_string(),
            summary_path: None,
            json_path: None,
        }
    }
}
