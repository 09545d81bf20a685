//! XML sitemap parsing and sitemap-based seeding

use super::parser::{parse_robots_txt, RobotsTxt};
use crate::config::CrawlerConfig;
use crate::url::is_domain_allowed;
use reqwest::Client;
use sitemap::reader::{SiteMapEntity, SiteMapReader};
use std::collections::{HashSet, VecDeque};
use std::io::Cursor;
use tracing::{debug, info};
use url::Url;

/// Sitemap indexes are followed at most this many levels deep
const MAX_SITEMAP_DEPTH: usize = 3;

/// At most this many sitemap documents are fetched per run
const MAX_SITEMAP_DOCUMENTS: usize = 10;

/// `<loc>` entries of one sitemap document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitemapDocument {
    /// Page URLs from a `<urlset>`
    pub pages: Vec<String>,

    /// Nested sitemap URLs from a `<sitemapindex>`
    pub sitemaps: Vec<String>,
}

impl SitemapDocument {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.sitemaps.is_empty()
    }
}

/// Returns every `<loc>` URL in a sitemap or sitemap index
///
/// Index entries are returned as-is; fetching the nested sitemaps is up to
/// the caller. Malformed XML yields an empty list.
///
/// # Example
///
/// ```
/// use legal_scout::robots::parse_sitemap_xml;
///
/// let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
/// <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <url><loc>https://example.com/privacy</loc></url>
/// </urlset>"#;
/// assert_eq!(parse_sitemap_xml(xml), vec!["https://example.com/privacy"]);
/// ```
pub fn parse_sitemap_xml(text: &str) -> Vec<String> {
    let document = parse_sitemap(text);
    document
        .pages
        .into_iter()
        .chain(document.sitemaps)
        .collect()
}

/// Parses a sitemap document, keeping page and index entries apart
pub fn parse_sitemap(text: &str) -> SitemapDocument {
    let mut document = SitemapDocument::default();

    if !text.contains("<urlset") && !text.contains("<sitemapindex") {
        return document;
    }

    for entity in SiteMapReader::new(Cursor::new(text.as_bytes())) {
        match entity {
            SiteMapEntity::Url(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    document.pages.push(url.to_string());
                }
            }
            SiteMapEntity::SiteMap(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    document.sitemaps.push(url.to_string());
                }
            }
            SiteMapEntity::Err(e) => {
                debug!("Malformed sitemap: {}", e);
                return SitemapDocument::default();
            }
        }
    }

    document
}

/// Fetches `/robots.txt` at the seed's origin
///
/// Any failure (network, non-2xx) is treated as an absent file.
pub async fn fetch_robots_txt(client: &Client, seed: &Url) -> Option<RobotsTxt> {
    let robots_url = seed.join("/robots.txt").ok()?;
    let body = fetch_text(client, &robots_url).await?;
    let robots = parse_robots_txt(&body);
    debug!(
        "Fetched {} ({} sitemap declarations)",
        robots_url,
        robots.sitemaps.len()
    );
    Some(robots)
}

/// Collects seed URLs from the sitemaps of the seed's site
///
/// Sitemaps declared in robots.txt are used when present, otherwise
/// `/sitemap.xml` at the seed origin. Indexes are expanded breadth-first.
/// Page URLs outside the allowed domains are dropped, and at most
/// `max_sitemap_urls` seeds are returned.
pub async fn discover_sitemap_seeds(
    client: &Client,
    seed: &Url,
    robots: Option<&RobotsTxt>,
    config: &CrawlerConfig,
) -> Vec<Url> {
    let mut pending: VecDeque<(String, usize)> = match robots {
        Some(r) if !r.sitemaps.is_empty() => r.sitemaps.iter().map(|s| (s.clone(), 0)).collect(),
        _ => match seed.join("/sitemap.xml") {
            Ok(fallback) => VecDeque::from([(fallback.to_string(), 0)]),
            Err(_) => VecDeque::new(),
        },
    };

    let mut fetched: HashSet<String> = HashSet::new();
    let mut seen_pages: HashSet<String> = HashSet::new();
    let mut seeds = Vec::new();

    while let Some((sitemap_url, level)) = pending.pop_front() {
        if seeds.len() >= config.max_sitemap_urls || fetched.len() >= MAX_SITEMAP_DOCUMENTS {
            break;
        }
        if !fetched.insert(sitemap_url.clone()) {
            continue;
        }
        if sitemap_url.ends_with(".gz") {
            debug!("Skipping compressed sitemap {}", sitemap_url);
            continue;
        }

        let Ok(parsed_url) = Url::parse(&sitemap_url) else {
            continue;
        };
        let Some(body) = fetch_text(client, &parsed_url).await else {
            continue;
        };

        let document = parse_sitemap(&body);
        debug!(
            "Sitemap {}: {} pages, {} nested sitemaps",
            sitemap_url,
            document.pages.len(),
            document.sitemaps.len()
        );

        if level + 1 < MAX_SITEMAP_DEPTH {
            pending.extend(document.sitemaps.into_iter().map(|s| (s, level + 1)));
        }

        for page in document.pages {
            if seeds.len() >= config.max_sitemap_urls {
                break;
            }
            let Ok(url) = Url::parse(&page) else {
                continue;
            };
            if is_domain_allowed(config, &url, seed) && seen_pages.insert(url.to_string()) {
                seeds.push(url);
            }
        }
    }

    if !seeds.is_empty() {
        info!("Seeded {} URLs from sitemaps", seeds.len());
    }
    seeds
}

async fn fetch_text(client: &Client, url: &Url) -> Option<String> {
    match client.get(url.as_str()).send().await {
        Ok(response) if response.status().is_success() => response.text().await.ok(),
        Ok(response) => {
            debug!("{} returned HTTP {}", url, response.status().as_u16());
            None
        }
        Err(e) => {
            debug!("Failed to fetch {}: {}", url, e);
            None
        }
    }
}
