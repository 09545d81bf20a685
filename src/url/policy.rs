//! Crawl admission policy
//!
//! Decides whether a candidate URL may be scheduled given depth, visited
//! state, and the configured domain rules. Everything here is a pure
//! predicate; nothing is recorded.

use crate::config::CrawlerConfig;
use crate::state::VisitedSet;
use crate::url::{extract_domain, matches_domain, root_domain};
use url::Url;

/// Path extensions that never hold document text
const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "bmp", "css", "js", "mjs", "woff", "woff2",
    "ttf", "eot", "otf", "mp3", "mp4", "webm", "avi", "mov", "wav", "zip", "gz", "tar", "rar",
    "7z", "dmg", "exe", "iso", "apk",
];

/// Outcome of evaluating a candidate URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The URL may be scheduled
    Admit,
    /// Discovery depth is beyond `max_depth`
    DepthExceeded,
    /// The URL was already dequeued in this run
    AlreadyVisited,
    /// Not an http(s) URL
    UnsupportedScheme,
    /// The host is outside the allowed domains
    DomainRejected,
    /// The path points at a static asset
    StaticAsset,
}

impl Admission {
    /// Returns true if the URL was admitted
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admit)
    }
}

/// Returns true if `candidate` may be scheduled at `depth`
///
/// Rules, in order: depth limit, visited state, domain matching. With
/// `follow_external_links` any domain passes; with an `allowed_domains`
/// list the candidate must fall under one of its entries (the base URL's
/// own host does not matter); otherwise it must share the base URL's root
/// domain.
pub fn should_crawl_url(
    config: &CrawlerConfig,
    visited: &VisitedSet,
    candidate: &Url,
    base: &Url,
    depth: u32,
) -> bool {
    evaluate_url(config, visited, candidate, base, depth).is_admitted()
}

/// Same as [`should_crawl_url`] but reports which rule rejected the URL
pub fn evaluate_url(
    config: &CrawlerConfig,
    visited: &VisitedSet,
    candidate: &Url,
    base: &Url,
    depth: u32,
) -> Admission {
    if depth > config.max_depth {
        return Admission::DepthExceeded;
    }

    if visited.contains(candidate) {
        return Admission::AlreadyVisited;
    }

    if candidate.scheme() != "http" && candidate.scheme() != "https" {
        return Admission::UnsupportedScheme;
    }

    if !is_domain_allowed(config, candidate, base) {
        return Admission::DomainRejected;
    }

    if is_static_asset(candidate) {
        return Admission::StaticAsset;
    }

    Admission::Admit
}

/// Applies only the domain rule of [`should_crawl_url`]
pub fn is_domain_allowed(config: &CrawlerConfig, candidate: &Url, base: &Url) -> bool {
    let Some(candidate_host) = extract_domain(candidate) else {
        return false;
    };

    if config.follow_external_links {
        return true;
    }

    match config.allowed_domains.as_deref() {
        Some(patterns) if !patterns.is_empty() => patterns
            .iter()
            .any(|pattern| matches_domain(pattern, &candidate_host)),
        _ => match extract_domain(base) {
            Some(base_host) => root_domain(&candidate_host) == root_domain(&base_host),
            None => false,
        },
    }
}

fn is_static_asset(url: &Url) -> bool {
    let last_segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    match last_segment.rsplit_once('.') {
        Some((_, ext)) => ASSET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}
