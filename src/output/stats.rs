//! Statistics over the results of a crawl run

use crate::crawler::PageResult;
use crate::state::PageOutcome;
use crate::url::extract_domain;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// Aggregated success/failure counts for a crawl run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrawlStats {
    /// Number of results
    pub total_pages: usize,

    pub successful: usize,

    pub failed: usize,

    /// Count per outcome name, zero counts omitted
    pub by_outcome: BTreeMap<&'static str, usize>,

    /// Count per discovery depth
    pub by_depth: BTreeMap<u32, usize>,

    /// Number of distinct hosts among the results
    pub unique_domains: usize,

    /// Mean legal score of successful results
    pub average_legal_score: Option<f64>,

    /// Total links seen across all pages
    pub links_discovered: usize,
}

impl CrawlStats {
    pub fn from_results(results: &[PageResult]) -> Self {
        let mut stats = Self {
            total_pages: results.len(),
            ..Self::default()
        };

        let mut domains = BTreeSet::new();
        let mut score_sum = 0.0;

        for result in results {
            *stats.by_outcome.entry(result.outcome.as_str()).or_insert(0) += 1;
            *stats.by_depth.entry(result.depth).or_insert(0) += 1;
            stats.links_discovered += result.discovered_urls.len();

            if result.success {
                stats.successful += 1;
                score_sum += result.legal_score;
            } else {
                stats.failed += 1;
            }

            if let Some(domain) = Url::parse(&result.url).ok().and_then(|u| extract_domain(&u)) {
                domains.insert(domain);
            }
        }

        stats.unique_domains = domains.len();
        if stats.successful > 0 {
            stats.average_legal_score = Some(score_sum / stats.successful as f64);
        }

        stats
    }

    /// Number of results that ended in `outcome`
    pub fn count(&self, outcome: PageOutcome) -> usize {
        self.by_outcome.get(outcome.as_str()).copied().unwrap_or(0)
    }

    /// Share of results that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            0.0
        } else {
            self.successful as f64 / self.total_pages as f64 * 100.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages fetched: {}", stats.total_pages);
    println!("  Successful: {}", stats.successful);
    println!("  Failed: {}", stats.failed);
    println!("  Unique domains: {}", stats.unique_domains);
    println!("  Links discovered: {}", stats.links_discovered);
    if let Some(avg) = stats.average_legal_score {
        println!("  Average legal score: {:.2}", avg);
    }
    println!();

    println!("Pages by Outcome:");
    for outcome in PageOutcome::all() {
        let count = stats.count(outcome);
        if count > 0 {
            println!("  {}: {}", outcome, count);
        }
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully processed)",
        stats.success_rate(),
        stats.successful,
        stats.total_pages
    );
}
