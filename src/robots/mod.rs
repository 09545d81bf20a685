//! Robots.txt and sitemap ingestion
//!
//! Both parsers are lenient: malformed input yields no sitemaps or URLs
//! rather than an error, and the crawl continues from its other seeds.

mod parser;
mod sitemaps;

pub use parser::{parse_robots_txt, RobotsTxt};
pub use sitemaps::{
    discover_sitemap_seeds, fetch_robots_txt, parse_sitemap, parse_sitemap_xml, SitemapDocument,
};
