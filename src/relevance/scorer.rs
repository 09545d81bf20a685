use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Only this many leading characters are searched for document-type phrases
const LEAD_CHARS: usize = 3000;

const PHRASE_WEIGHT: f64 = 0.15;
const PHRASE_CAP: f64 = 0.45;
const TERM_WEIGHT: f64 = 0.03;
const TERM_CAP: f64 = 0.2;
const TITLE_WEIGHT: f64 = 0.15;
const URL_WEIGHT: f64 = 0.2;

const LINK_URL_WEIGHT: f64 = 0.5;
const LINK_ANCHOR_PHRASE_WEIGHT: f64 = 0.4;
const LINK_ANCHOR_WORD_WEIGHT: f64 = 0.2;

/// Share of the parent page's score inherited by its links
const PARENT_SHARE: f64 = 0.3;

/// Phrases naming a legal document type
static DOCUMENT_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"privacy (?:policy|notice|statement)",
        r"terms (?:of (?:service|use)|and conditions)",
        r"cookie (?:policy|notice)",
        r"user agreement",
        r"data (?:collection|processing agreement|protection)",
        r"acceptable use policy",
        r"end[- ]user license agreement",
        r"legal notice",
    ]
    .iter()
    .map(|p| {
        Regex::new(&format!(r"(?i)\b{}\b", p))
            .expect("DOCUMENT_PHRASES: hardcoded regex is valid")
    })
    .collect()
});

/// Vocabulary that shows up in the body of legal text
static LEGAL_TERMS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"personal (?:data|information)",
        r"third[- ]part(?:y|ies)",
        r"liabilit(?:y|ies)",
        r"governing law",
        r"arbitration",
        r"indemnif\w*",
        r"data controller",
        r"gdpr",
        r"ccpa",
        r"opt[- ]out",
        r"consent",
        r"retention",
        r"warrant(?:y|ies)",
        r"jurisdiction",
    ]
    .iter()
    .map(|p| {
        Regex::new(&format!(r"(?i)\b{}\b", p))
            .expect("LEGAL_TERMS: hardcoded regex is valid")
    })
    .collect()
});

static LEGAL_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(privacy|terms|cookies?|legal|policy|policies|agreement|conditions|gdpr|dpa|disclaimer|imprint|impressum)\b")
        .expect("LEGAL_TITLE: hardcoded regex is valid")
});

static LEGAL_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(privacy|terms|cookie|legal|gdpr|ccpa|polic(?:y|ies)|agreement|disclaimer|imprint|impressum|conditions|\b(?:tos|dpa|eula)\b)")
        .expect("LEGAL_PATH: hardcoded regex is valid")
});

/// Per-signal contributions of a document score
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub phrases: f64,
    pub terms: f64,
    pub title: f64,
    pub url: f64,
}

impl ScoreBreakdown {
    /// Sum of all signals, clamped to `[0.0, 1.0]`
    pub fn total(&self) -> f64 {
        (self.phrases + self.terms + self.title + self.url).clamp(0.0, 1.0)
    }
}

/// Scores extracted page text for legal relevance
///
/// Document-type phrases count only in the lead of the text; general legal
/// vocabulary counts anywhere. The page title and URL path add weight
/// independent of content.
///
/// # Examples
///
/// ```
/// use legal_scout::relevance::score_document;
///
/// let legal = score_document("Privacy Policy. We collect personal data...", None, None);
/// let other = score_document("Our new espresso machine is here!", None, None);
/// assert!(legal > other);
/// ```
pub fn score_document(text: &str, url: Option<&Url>, title: Option<&str>) -> f64 {
    breakdown(text, url, title).total()
}

/// Same as [`score_document`] but returns each signal separately
pub fn breakdown(text: &str, url: Option<&Url>, title: Option<&str>) -> ScoreBreakdown {
    let lead = lead_of(text);

    let phrase_hits = DOCUMENT_PHRASES.iter().filter(|re| re.is_match(lead)).count();
    let term_hits = LEGAL_TERMS.iter().filter(|re| re.is_match(text)).count();

    ScoreBreakdown {
        phrases: (phrase_hits as f64 * PHRASE_WEIGHT).min(PHRASE_CAP),
        terms: (term_hits as f64 * TERM_WEIGHT).min(TERM_CAP),
        title: match title {
            Some(t) if LEGAL_TITLE.is_match(t) => TITLE_WEIGHT,
            _ => 0.0,
        },
        url: match url {
            Some(u) if path_is_legal(u) => URL_WEIGHT,
            _ => 0.0,
        },
    }
}

/// Scores an undiscovered link from its URL and anchor text
pub fn score_link(url: &Url, anchor_text: &str) -> f64 {
    let mut score = 0.0;

    if path_is_legal(url) {
        score += LINK_URL_WEIGHT;
    }

    if DOCUMENT_PHRASES.iter().any(|re| re.is_match(anchor_text)) {
        score += LINK_ANCHOR_PHRASE_WEIGHT;
    } else if LEGAL_TITLE.is_match(anchor_text) {
        score += LINK_ANCHOR_WORD_WEIGHT;
    }

    score.clamp(0.0, 1.0)
}

/// Priority hint for a newly discovered link
///
/// Blends the link's own score with a share of the score of the page it was
/// found on, so links from legal pages are explored before links from
/// unrelated pages when neither carries a signal of its own.
pub fn discovery_hint(url: &Url, anchor_text: &str, parent_score: f64) -> f64 {
    let own = score_link(url, anchor_text);
    let inherited = parent_score.clamp(0.0, 1.0) * PARENT_SHARE;
    (own * (1.0 - PARENT_SHARE) + inherited).clamp(0.0, 1.0)
}

fn lead_of(text: &str) -> &str {
    match text.char_indices().nth(LEAD_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn path_is_legal(url: &Url) -> bool {
    let host_prefix = url
        .host_str()
        .and_then(|h| h.split('.').next())
        .unwrap_or("");
    LEGAL_PATH.is_match(url.path()) || LEGAL_PATH.is_match(host_prefix)
}
