//! Legal relevance scoring
//!
//! Scores are heuristic confidences in `[0.0, 1.0]` that a page (or a link,
//! before it is fetched) is a legal or policy document. They order the
//! priority frontier and filter crawl output. Every function here is pure.

mod scorer;

pub use scorer::{breakdown, discovery_hint, score_document, score_link, ScoreBreakdown};
