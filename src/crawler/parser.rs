//! Link and metadata extraction from HTML
//!
//! This module handles parsing HTML content to extract:
//! - Candidate links from every markup source we know about
//! - Page identity signals (canonical, Open Graph, JSON-LD)
//! - Page-level hints (title, description, language, robots directives)

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

static ONCLICK_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:window\.|document\.)?location(?:\.href)?\s*=\s*['"]([^'"]+)['"]"#)
        .expect("ONCLICK_LOCATION: hardcoded regex is valid")
});

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"'(){}\[\]]+"#).expect("BARE_URL: hardcoded regex is valid")
});

/// Elements whose text is never scanned for bare URLs
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Where in the markup a link was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkSource {
    Anchor,
    DataAttribute,
    Area,
    Form,
    OnClick,
    Text,
    Canonical,
    OpenGraph,
    JsonLd,
}

/// A candidate link, resolved against the page URL
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedLink {
    pub url: Url,
    /// Anchor text (or alt/title text), whitespace-collapsed
    pub text: String,
    /// Raw `rel` attribute, if any
    pub rel: Option<String>,
    pub source: LinkSource,
}

impl ExtractedLink {
    /// Returns true if the link's own `rel` carries `nofollow`
    pub fn is_nofollow(&self) -> bool {
        self.rel
            .as_deref()
            .is_some_and(|rel| has_token(rel, &["nofollow"]))
    }
}

/// Page-level signals gathered while parsing one response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageMetadata {
    /// `<link rel="canonical">` href as written (may be relative)
    pub canonical_url: Option<String>,
    pub og_url: Option<String>,
    /// First `url` field found in embedded JSON-LD
    pub json_ld_url: Option<String>,
    /// Robots meta content, merged with any `X-Robots-Tag` header
    pub robots: Option<String>,
    pub content_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
}

impl PageMetadata {
    /// Returns true if no links from this page may be followed
    pub fn is_nofollow(&self) -> bool {
        self.robots
            .as_deref()
            .is_some_and(|r| has_token(r, &["nofollow", "none"]))
    }

    /// Returns true if the page asks not to be indexed
    pub fn is_noindex(&self) -> bool {
        self.robots
            .as_deref()
            .is_some_and(|r| has_token(r, &["noindex", "none"]))
    }

    /// Merges an `X-Robots-Tag` header value into the robots directive
    pub fn merge_robots_header(&mut self, header: &str) {
        let header = header.trim();
        if header.is_empty() {
            return;
        }
        self.robots = Some(match self.robots.take() {
            Some(existing) => format!("{}, {}", existing, header),
            None => header.to_string(),
        });
    }
}

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Candidate links in first-seen order, without duplicates
    pub links: Vec<ExtractedLink>,

    pub metadata: PageMetadata,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Sources
///
/// - `<a href>` and `<area href>`
/// - `data-href` and `data-url` on any element
/// - `<form action>`
/// - `onclick` handlers assigning `location` / `location.href`
/// - Bare `http(s)://` URLs in text content
/// - `<link rel="canonical">`, `<meta property="og:url">`, and `url`
///   fields of JSON-LD blocks (also surfaced in [`PageMetadata`])
///
/// `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only links are
/// dropped. Relative links resolve against `<base href>` when present,
/// otherwise against `base_url`.
///
/// # Example
///
/// ```
/// use legal_scout::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Legal</title></head><body><a href="/privacy">Privacy</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Legal".to_string()));
/// assert_eq!(parsed.links[0].url.as_str(), "https://example.com/privacy");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);
    let base = document_base(&document, base_url);

    let title = extract_title(&document);
    let mut metadata = extract_metadata(&document);
    metadata.title = title.clone();

    let mut links = LinkCollector::default();

    for (css, attr, source) in [
        ("a[href]", "href", LinkSource::Anchor),
        ("[data-href]", "data-href", LinkSource::DataAttribute),
        ("[data-url]", "data-url", LinkSource::DataAttribute),
        ("area[href]", "href", LinkSource::Area),
        ("form[action]", "action", LinkSource::Form),
    ] {
        collect_attr(&document, css, attr, source, &base, &mut links);
    }
    collect_onclick(&document, &base, &mut links);
    collect_text_urls(&document, &mut links);

    for (href, source) in [
        (&metadata.canonical_url, LinkSource::Canonical),
        (&metadata.og_url, LinkSource::OpenGraph),
    ] {
        if let Some(url) = href.as_deref().and_then(|h| resolve_link(h, &base)) {
            links.push(url, String::new(), None, source);
        }
    }

    for raw in extract_json_ld_urls(&document) {
        if metadata.json_ld_url.is_none() {
            metadata.json_ld_url = Some(raw.clone());
        }
        if let Some(url) = resolve_link(&raw, &base) {
            links.push(url, String::new(), None, LinkSource::JsonLd);
        }
    }

    ParsedPage {
        title,
        links: links.into_links(),
        metadata,
    }
}

/// Keeps links unique by URL while preserving first-seen order
#[derive(Default)]
struct LinkCollector {
    links: Vec<ExtractedLink>,
    index: HashMap<String, usize>,
}

impl LinkCollector {
    fn push(&mut self, url: Url, text: String, rel: Option<String>, source: LinkSource) {
        let candidate = ExtractedLink {
            url,
            text,
            rel,
            source,
        };

        match self.index.get(candidate.url.as_str()) {
            Some(&i) => {
                // A followable occurrence wins over an earlier nofollow one
                let existing = &mut self.links[i];
                if existing.is_nofollow() && !candidate.is_nofollow() {
                    existing.rel = candidate.rel;
                }
                if existing.text.is_empty() {
                    existing.text = candidate.text;
                }
            }
            None => {
                self.index
                    .insert(candidate.url.as_str().to_string(), self.links.len());
                self.links.push(candidate);
            }
        }
    }

    fn into_links(self) -> Vec<ExtractedLink> {
        self.links
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn collect_attr(
    document: &Html,
    css: &str,
    attr: &str,
    source: LinkSource,
    base: &Url,
    links: &mut LinkCollector,
) {
    let Some(sel) = selector(css) else {
        return;
    };

    for element in document.select(&sel) {
        if let Some(url) = element.value().attr(attr).and_then(|h| resolve_link(h, base)) {
            links.push(
                url,
                link_text(&element),
                element.value().attr("rel").map(str::to_string),
                source,
            );
        }
    }
}

fn collect_onclick(document: &Html, base: &Url, links: &mut LinkCollector) {
    let Some(sel) = selector("[onclick]") else {
        return;
    };

    for element in document.select(&sel) {
        let Some(handler) = element.value().attr("onclick") else {
            continue;
        };
        for caps in ONCLICK_LOCATION.captures_iter(handler) {
            if let Some(url) = resolve_link(&caps[1], base) {
                links.push(url, link_text(&element), None, LinkSource::OnClick);
            }
        }
    }
}

fn collect_text_urls(document: &Html, links: &mut LinkCollector) {
    for node in document.tree.nodes() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| NON_CONTENT_TAGS.contains(&e.name()))
        });
        if hidden {
            continue;
        }

        for found in BARE_URL.find_iter(text) {
            let raw = found
                .as_str()
                .trim_end_matches(['.', ',', ';', ':', '!', '?']);
            if let Ok(url) = Url::parse(raw) {
                links.push(url, String::new(), None, LinkSource::Text);
            }
        }
    }
}

/// Pulls every `url` string out of the page's JSON-LD blocks
fn extract_json_ld_urls(document: &Html) -> Vec<String> {
    let mut urls = Vec::new();
    let Some(sel) = selector(r#"script[type="application/ld+json"]"#) else {
        return urls;
    };

    for element in document.select(&sel) {
        let raw = element.text().collect::<String>();
        // Malformed blocks are common in the wild; skip them
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) {
            walk_json_ld(&value, &mut urls);
        }
    }

    urls
}

fn walk_json_ld(value: &serde_json::Value, urls: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(map) => {
            // An object's own url comes before those of nested entities
            if let Some(serde_json::Value::String(url)) = map.get("url") {
                urls.push(url.clone());
            }
            for (key, child) in map {
                if key != "url" || !child.is_string() {
                    walk_json_ld(child, urls);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                walk_json_ld(item, urls);
            }
        }
        _ => {}
    }
}

fn extract_metadata(document: &Html) -> PageMetadata {
    let mut metadata = PageMetadata::default();

    if let Some(sel) = selector("link[rel][href]") {
        metadata.canonical_url = document
            .select(&sel)
            .find(|e| {
                e.value()
                    .attr("rel")
                    .is_some_and(|rel| has_token(rel, &["canonical"]))
            })
            .and_then(|e| non_empty_attr(&e, "href"));
    }

    if let Some(sel) = selector("meta[content]") {
        for element in document.select(&sel) {
            let value = element.value();
            let name = value
                .attr("name")
                .or_else(|| value.attr("property"))
                .unwrap_or("")
                .to_ascii_lowercase();
            let slot = match name.as_str() {
                "og:url" => &mut metadata.og_url,
                "robots" => &mut metadata.robots,
                "description" => &mut metadata.description,
                _ => continue,
            };
            if slot.is_none() {
                *slot = non_empty_attr(&element, "content");
            }
        }
    }

    if let Some(sel) = selector("html[lang]") {
        metadata.language = document
            .select(&sel)
            .next()
            .and_then(|e| non_empty_attr(&e, "lang"));
    }

    metadata
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = selector("title")?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Honors `<base href>` when the document declares one
fn document_base(document: &Html, page_url: &Url) -> Url {
    selector("base[href]")
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .and_then(|e| e.value().attr("href"))
                .and_then(|href| page_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| page_url.clone())
}

fn link_text(element: &ElementRef) -> String {
    let text = collapse_whitespace(&element.text().collect::<String>());
    if !text.is_empty() {
        return text;
    }
    element
        .value()
        .attr("title")
        .or_else(|| element.value().attr("alt"))
        .or_else(|| element.value().attr("aria-label"))
        .map(collapse_whitespace)
        .unwrap_or_default()
}

fn non_empty_attr(element: &ElementRef, attr: &str) -> Option<String> {
    element
        .value()
        .attr(attr)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns true if a comma- or space-separated directive list contains any of `tokens`
fn has_token(list: &str, tokens: &[&str]) -> bool {
    list.split(|c: char| c == ',' || c.is_whitespace())
        .any(|t| tokens.iter().any(|want| t.eq_ignore_ascii_case(want)))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub(crate) fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url)
        }
        _ => None,
    }
}
