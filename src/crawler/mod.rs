//! Crawler module for page fetching and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - HTML parsing and link extraction
//! - The frontier and its scheduling strategies
//! - HTTP fetching, content routing, and canonical resolution
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::Crawler;
pub use fetcher::{build_http_client, choose_effective_url, Fetcher, PageFetch, PageResult};
pub use frontier::{CrawlTarget, Frontier};
pub use parser::{parse_html, ExtractedLink, LinkSource, PageMetadata, ParsedPage};
