//! Per-page outcome classification
//!
//! Every fetch attempt ends in exactly one of these outcomes. Only
//! `Processed` counts as success; every other variant is recorded on the
//! page result and the crawl carries on.
use serde::Serialize;
use std::fmt;

/// Final classification of a single fetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOutcome {
    // ===== Success =====
    /// Page was fetched and its text extracted
    Processed,

    // ===== Transport failures =====
    /// Server answered with a non-2xx status
    HttpError,

    /// Timeout, connection refused, DNS or TLS failure
    Unreachable,

    /// Path is disallowed by robots.txt (only when robots rules are honored)
    RobotsDenied,

    // ===== Content failures =====
    /// Binary document seen while binary crawling is disabled
    BinarySkipped,

    /// Content type the crawler does not extract (images, json, ...)
    UnsupportedContent,

    /// Every extractor in the chain came back empty
    ExtractionFailed,
}

impl PageOutcome {
    /// Returns true if this represents a successful extraction
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Processed)
    }

    /// Returns true for network and HTTP level failures
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::HttpError | Self::Unreachable | Self::RobotsDenied)
    }

    /// Returns true for failures that happened after a successful response
    pub fn is_content_failure(&self) -> bool {
        matches!(
            self,
            Self::BinarySkipped | Self::UnsupportedContent | Self::ExtractionFailed
        )
    }

    /// Stable lowercase name, used for storage and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::HttpError => "http_error",
            Self::Unreachable => "unreachable",
            Self::RobotsDenied => "robots_denied",
            Self::BinarySkipped => "binary_skipped",
            Self::UnsupportedContent => "unsupported_content",
            Self::ExtractionFailed => "extraction_failed",
        }
    }

    /// Returns all outcomes, in report order
    pub fn all() -> [Self; 7] {
        [
            Self::Processed,
            Self::HttpError,
            Self::Unreachable,
            Self::RobotsDenied,
            Self::BinarySkipped,
            Self::UnsupportedContent,
            Self::ExtractionFailed,
        ]
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_processed_is_success() {
        for outcome in PageOutcome::all() {
            assert_eq!(outcome.is_success(), outcome == PageOutcome::Processed);
        }
    }

    #[test]
    fn test_failure_classes_are_disjoint() {
        for outcome in PageOutcome::all() {
            let classes = [
                outcome.is_success(),
                outcome.is_transport_failure(),
                outcome.is_content_failure(),
            ];
            assert_eq!(
                classes.iter().filter(|c| **c).count(),
                1,
                "{:?} must belong to exactly one class",
                outcome
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(PageOutcome::Processed.to_string(), "processed");
        assert_eq!(PageOutcome::ExtractionFailed.to_string(), "extraction_failed");
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_string(&PageOutcome::BinarySkipped).unwrap();
        assert_eq!(json, "\"binary_skipped\"");
    }
}
