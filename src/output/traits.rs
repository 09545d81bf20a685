//! Output error and summary types
//!
//! This module defines the error type for report writers and the summary
//! structure they render.

use crate::crawler::PageResult;
use crate::output::stats::CrawlStats;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A successfully extracted document, as listed in reports
#[derive(Debug, Clone, Serialize)]
pub struct DocumentEntry {
    pub url: String,
    pub title: Option<String>,
    pub legal_score: f64,
    pub depth: u32,
    pub content_chars: usize,
}

/// A failed fetch, as listed in reports
#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    pub url: String,
    pub outcome: String,
    pub status_code: Option<u16>,
    pub message: String,
}

/// Summary of one crawl run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    // Run metadata
    pub seed_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub strategy: String,
    pub config_hash: Option<String>,
    pub cancelled: bool,

    pub stats: CrawlStats,

    /// Successful results, highest legal score first
    pub documents: Vec<DocumentEntry>,

    /// Failed results, in crawl order
    pub failures: Vec<FailureEntry>,
}

impl CrawlSummary {
    /// Builds a summary from the results of a run
    pub fn from_results(
        seed_url: &str,
        strategy: impl ToString,
        started_at: DateTime<Utc>,
        results: &[PageResult],
    ) -> Self {
        let mut documents: Vec<DocumentEntry> = results
            .iter()
            .filter(|r| r.success)
            .map(|r| DocumentEntry {
                url: r.effective_url.clone(),
                title: r.title.clone(),
                legal_score: r.legal_score,
                depth: r.depth,
                content_chars: r.content.as_ref().map_or(0, |c| c.chars().count()),
            })
            .collect();
        documents.sort_by(|a, b| b.legal_score.total_cmp(&a.legal_score));

        let failures = results
            .iter()
            .filter(|r| !r.success)
            .map(|r| FailureEntry {
                url: r.url.clone(),
                outcome: r.outcome.to_string(),
                status_code: r.status_code,
                message: r.error_message.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            seed_url: seed_url.to_string(),
            started_at,
            finished_at: Utc::now(),
            strategy: strategy.to_string(),
            config_hash: None,
            cancelled: false,
            stats: CrawlStats::from_results(results),
            documents,
            failures,
        }
    }

    /// Run duration in whole seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds().max(0)
    }
}
