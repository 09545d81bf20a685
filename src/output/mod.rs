//! Output module for crawl summaries and reports
//!
//! This module handles:
//! - Aggregating success/failure statistics over crawl results
//! - Generating markdown summaries
//! - Exporting results as JSON

mod json;
mod markdown;
pub mod stats;
mod traits;

pub use json::{format_json_report, write_json_report, JsonReport};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, CrawlStats};
pub use traits::{CrawlSummary, DocumentEntry, FailureEntry, OutputError, OutputResult};
