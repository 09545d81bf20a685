//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including statistics, the documents found, and a failure report.

use crate::output::traits::{CrawlSummary, OutputResult};
use crate::state::PageOutcome;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Failures listed before the report is cut off
const MAX_LISTED_FAILURES: usize = 50;

/// Writes the markdown summary of `summary` to `output_path`
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();
    let stats = &summary.stats;

    md.push_str("# Legal-Scout Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed URL**: {}\n", summary.seed_url));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {} seconds\n",
        summary.duration_seconds()
    ));
    md.push_str(&format!("- **Strategy**: {}\n", summary.strategy));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    if summary.cancelled {
        md.push_str("- **Status**: cancelled (partial results)\n");
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Fetched**: {}\n", stats.total_pages));
    md.push_str(&format!("- **Successful**: {}\n", stats.successful));
    md.push_str(&format!("- **Failed**: {}\n", stats.failed));
    md.push_str(&format!("- **Unique Domains**: {}\n", stats.unique_domains));
    md.push_str(&format!("- **Links Discovered**: {}\n", stats.links_discovered));
    md.push_str(&format!("- **Success Rate**: {:.2}%\n", stats.success_rate()));
    if let Some(avg) = stats.average_legal_score {
        md.push_str(&format!("- **Average Legal Score**: {:.2}\n", avg));
    }
    md.push('\n');

    // Outcome breakdown
    md.push_str("## Outcome Breakdown\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    for outcome in PageOutcome::all() {
        md.push_str(&format!("| {} | {} |\n", outcome, stats.count(outcome)));
    }
    md.push('\n');

    // Depth breakdown
    if !stats.by_depth.is_empty() {
        md.push_str("## Depth Breakdown\n\n");
        md.push_str("| Depth | Pages |\n");
        md.push_str("|-------|-------|\n");
        for (depth, count) in &stats.by_depth {
            md.push_str(&format!("| {} | {} |\n", depth, count));
        }
        md.push('\n');
    }

    // Documents
    if !summary.documents.is_empty() {
        md.push_str("## Documents\n\n");
        md.push_str("| Score | Title | URL | Characters |\n");
        md.push_str("|-------|-------|-----|------------|\n");
        for doc in &summary.documents {
            md.push_str(&format!(
                "| {:.2} | {} | {} | {} |\n",
                doc.legal_score,
                escape_cell(doc.title.as_deref().unwrap_or("-")),
                doc.url,
                doc.content_chars
            ));
        }
        md.push('\n');
    }

    // Failures
    if !summary.failures.is_empty() {
        md.push_str("## Failures\n\n");
        md.push_str("| URL | Outcome | Status | Message |\n");
        md.push_str("|-----|---------|--------|---------|\n");
        for failure in summary.failures.iter().take(MAX_LISTED_FAILURES) {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                failure.url,
                failure.outcome,
                failure
                    .status_code
                    .map_or_else(|| "-".to_string(), |s| s.to_string()),
                escape_cell(&failure.message)
            ));
        }
        if summary.failures.len() > MAX_LISTED_FAILURES {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.failures.len() - MAX_LISTED_FAILURES
            ));
        }
        md.push('\n');
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{PageMetadata, PageResult};
    use chrono::Utc;

    fn page(url: &str, outcome: PageOutcome, score: f64) -> PageResult {
        PageResult {
            url: url.to_string(),
            effective_url: url.to_string(),
            success: outcome.is_success(),
            status_code: Some(if outcome.is_success() { 200 } else { 404 }),
            title: outcome.is_success().then(|| "Privacy | Acme".to_string()),
            content: outcome.is_success().then(|| "Privacy policy text".to_string()),
            legal_score: score,
            discovered_urls: Vec::new(),
            metadata: PageMetadata::default(),
            error_message: (!outcome.is_success()).then(|| "HTTP 404 Not Found".to_string()),
            outcome,
            depth: 1,
            fetched_at: Utc::now(),
        }
    }

    fn create_test_summary() -> CrawlSummary {
        let results = vec![
            page("https://acme.com/privacy", PageOutcome::Processed, 0.75),
            page("https://acme.com/gone", PageOutcome::HttpError, 0.0),
        ];
        let mut summary =
            CrawlSummary::from_results("https://acme.com/", "priority", Utc::now(), &results);
        summary.config_hash = Some("abc123".to_string());
        summary
    }

    #[test]
    fn test_format_markdown_summary() {
        let markdown = format_markdown_summary(&create_test_summary());

        assert!(markdown.contains("# Legal-Scout Crawl Summary"));
        assert!(markdown.contains("- **Seed URL**: https://acme.com/"));
        assert!(markdown.contains("- **Config Hash**: abc123"));
        assert!(markdown.contains("- **Success Rate**: 50.00%"));
        assert!(markdown.contains("| processed | 1 |"));
        assert!(markdown.contains("| http_error | 1 |"));
        assert!(markdown.contains("| unreachable | 0 |"));
    }

    #[test]
    fn test_documents_and_failures_listed() {
        let markdown = format_markdown_summary(&create_test_summary());

        assert!(markdown.contains("| 0.75 | Privacy \\| Acme | https://acme.com/privacy | 19 |"));
        assert!(markdown.contains("| https://acme.com/gone | http_error | 404 | HTTP 404 Not Found |"));
        assert!(!markdown.contains("cancelled"));
    }

    #[test]
    fn test_generate_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");

        generate_markdown_summary(&create_test_summary(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Legal-Scout Crawl Summary"));
    }
}
