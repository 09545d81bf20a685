//! Legal-Scout main entry point
//!
//! This is the command-line interface for the Legal-Scout document crawler.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use legal_scout::config::{load_config_with_hash, Config};
use legal_scout::output::{
    generate_markdown_summary, print_statistics, write_json_report, CrawlSummary,
};
use legal_scout::relevance::breakdown;
use legal_scout::storage::{open_storage, persist_results};
use legal_scout::{Crawler, PageResult};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Legal-Scout: a legal-document crawler
///
/// Legal-Scout explores an organization's website from a seed URL, finds
/// privacy policies, terms of service, and similar documents, and extracts
/// their text from HTML and PDF.
#[derive(Parser, Debug)]
#[command(name = "legal-scout")]
#[command(version)]
#[command(about = "A legal-document crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed URL to crawl from
    #[arg(value_name = "URL")]
    url: String,

    /// Fetch and score only this URL, without following links
    #[arg(long, conflicts_with_all = ["dry_run", "company"])]
    test_url: bool,

    /// Store the documents found under this company slug
    #[arg(long, value_name = "SLUG")]
    company: Option<String>,

    /// Write all results as JSON to this path (overrides output.json-path)
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.url)
    } else if cli.test_url {
        handle_test_url(config, &cli.url).await
    } else {
        handle_crawl(config, config_hash, &cli).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("legal_scout=info,warn"),
            1 => EnvFilter::new("legal_scout=debug,info"),
            2 => EnvFilter::new("legal_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, seed: &str) -> anyhow::Result<()> {
    let seed = legal_scout::normalize_url(seed).context("Invalid seed URL")?;
    let crawler = &config.crawler;

    println!("=== Legal-Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", seed);
    println!("  Strategy: {}", crawler.strategy);
    println!("  Max depth: {}", crawler.max_depth);
    println!("  Max pages: {}", crawler.max_pages);
    println!("  Concurrent requests: {}", crawler.max_concurrent_requests);
    println!("  Delay between requests: {}s", crawler.delay_between_requests);
    match &crawler.allowed_domains {
        Some(domains) => println!("  Allowed domains: {}", domains.join(", ")),
        None => println!("  Allowed domains: same root domain as the linking page"),
    }
    println!("  Follow external links: {}", crawler.follow_external_links);
    println!("  Follow nofollow links: {}", crawler.follow_nofollow);
    println!("  Minimum legal score: {}", crawler.min_legal_score);
    println!("  Binary crawling: {}", crawler.enable_binary_crawling);
    println!("  Sitemaps: {}", crawler.use_sitemaps);
    println!("  Respect robots.txt: {}", crawler.respect_robots_txt);

    println!("\nExtraction:");
    println!("  pdftotext: {}", config.extraction.enable_pdftotext);
    if let Some(service) = &config.extraction.extraction_service_url {
        println!("  Extraction service: {}", service);
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }
    if let Some(json) = &config.output.json_path {
        println!("  JSON: {}", json);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling from {}", seed);

    Ok(())
}

/// Handles the --test-url mode: one fetch, full diagnostics
async fn handle_test_url(config: Config, url: &str) -> anyhow::Result<()> {
    let crawler = Crawler::new(config)?;
    let result = crawler.test_specific_url(url).await?;

    println!("=== {} ===\n", result.url);
    println!("Outcome: {}", result.outcome);
    if let Some(status) = result.status_code {
        println!("Status: {}", status);
    }
    println!("Effective URL: {}", result.effective_url);
    if let Some(title) = &result.title {
        println!("Title: {}", title);
    }
    if let Some(error) = &result.error_message {
        println!("Error: {}", error);
    }

    let meta = &result.metadata;
    for (label, value) in [
        ("Content type", &meta.content_type),
        ("Canonical", &meta.canonical_url),
        ("Open Graph URL", &meta.og_url),
        ("JSON-LD URL", &meta.json_ld_url),
        ("Robots", &meta.robots),
        ("Language", &meta.language),
    ] {
        if let Some(value) = value {
            println!("{}: {}", label, value);
        }
    }

    if let Some(content) = &result.content {
        let effective = Url::parse(&result.effective_url).ok();
        let scores = breakdown(content, effective.as_ref(), result.title.as_deref());
        println!(
            "\nLegal score: {:.2} (phrases {:.2}, terms {:.2}, title {:.2}, url {:.2})",
            result.legal_score, scores.phrases, scores.terms, scores.title, scores.url
        );
        println!("Text: {} characters", content.chars().count());
        let preview: String = content.chars().take(500).collect();
        println!("\n{}\n", preview);
    }

    println!("Links discovered: {}", result.discovered_urls.len());
    for link in result.discovered_urls.iter().take(20) {
        println!("  - {}", link);
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String, cli: &Cli) -> anyhow::Result<()> {
    let output = config.output.clone();
    let strategy = config.crawler.strategy;
    let min_score = config.crawler.min_legal_score;
    let crawler = Crawler::new(config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight requests...");
            ctrl_c.cancel();
        }
    });

    let started = Utc::now();
    let results = crawler
        .crawl_with_cancellation(&cli.url, cancel.clone())
        .await?;

    let mut summary = CrawlSummary::from_results(&cli.url, strategy, started, &results);
    summary.config_hash = Some(config_hash);
    summary.cancelled = cancel.is_cancelled();

    print_statistics(&summary.stats);
    print_documents(&results);

    if let Some(path) = &output.summary_path {
        generate_markdown_summary(&summary, Path::new(path))?;
        println!("\n✓ Summary written to: {}", path);
    }

    let json_path = cli
        .json
        .clone()
        .or_else(|| output.json_path.as_ref().map(PathBuf::from));
    if let Some(path) = json_path {
        write_json_report(&summary, &results, &path)?;
        println!("✓ Results written to: {}", path.display());
    }

    if let Some(slug) = &cli.company {
        let mut store = open_storage(Path::new(&output.database_path))?;
        let company = store.ensure_company(slug, slug)?;
        let stored = persist_results(&mut store, company.id, &results, min_score)?;
        println!(
            "✓ Stored {} documents for {} in {}",
            stored, slug, output.database_path
        );
    }

    Ok(())
}

fn print_documents(results: &[PageResult]) {
    let mut documents: Vec<&PageResult> = results.iter().filter(|r| r.success).collect();
    if documents.is_empty() {
        return;
    }
    documents.sort_by(|a, b| b.legal_score.total_cmp(&a.legal_score));

    println!("\nDocuments:");
    for doc in documents {
        println!(
            "  {:.2}  {}  {}",
            doc.legal_score,
            doc.effective_url,
            doc.title.as_deref().unwrap_or("")
        );
    }
}
