use super::binary::{BinaryExtractor, PdfExtractExtractor, PdftotextExtractor, ServiceExtractor};
use super::content::{classify_content, ContentKind};
use super::html::html_to_text;
use crate::config::ExtractionConfig;
use std::fmt;
use tracing::{debug, warn};

/// How one extractor fared on a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Produced usable text of this many characters
    Extracted { chars: usize },
    /// Ran but produced no usable text
    Empty,
    /// Errored or panicked
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionAttempt {
    pub extractor: &'static str,
    pub outcome: AttemptOutcome,
}

/// Extracted text plus a record of every extractor that was tried
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub kind: ContentKind,
    pub text: Option<String>,
    pub attempts: Vec<ExtractionAttempt>,
}

impl ExtractionReport {
    /// Name of the extractor whose text was kept
    pub fn extractor(&self) -> Option<&'static str> {
        self.attempts
            .iter()
            .find(|a| matches!(a.outcome, AttemptOutcome::Extracted { .. }))
            .map(|a| a.extractor)
    }

    /// One-line description of all attempts, used as a page error message
    pub fn summary(&self) -> String {
        if self.attempts.is_empty() {
            return format!("no extractor for {:?} content", self.kind);
        }
        self.attempts
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for ExtractionAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Extracted { chars } => write!(f, "{}: {} chars", self.extractor, chars),
            AttemptOutcome::Empty => write!(f, "{}: no text", self.extractor),
            AttemptOutcome::Failed(reason) => write!(f, "{}: failed ({})", self.extractor, reason),
        }
    }
}

/// Extracts normalized text from fetched documents
///
/// HTML is converted directly. PDF and office documents go through the
/// binary chain: extractors run in order and the first one to produce at
/// least `min_text_chars` of text wins. The processor holds no per-document
/// state and can be shared between workers.
pub struct DocumentProcessor {
    extractors: Vec<Box<dyn BinaryExtractor>>,
    min_text_chars: usize,
}

impl DocumentProcessor {
    /// Builds the chain from configuration
    ///
    /// Order: `pdf-extract`, then `pdftotext` if enabled, then the extraction
    /// service if one is configured.
    pub fn from_config(config: &ExtractionConfig, client: reqwest::Client) -> Self {
        let mut extractors: Vec<Box<dyn BinaryExtractor>> = vec![Box::new(PdfExtractExtractor)];

        if config.enable_pdftotext {
            extractors.push(Box::new(PdftotextExtractor::new(
                config.pdftotext_path.clone(),
            )));
        }

        if let Some(endpoint) = &config.extraction_service_url {
            extractors.push(Box::new(ServiceExtractor::new(client, endpoint.clone())));
        }

        Self::with_extractors(extractors, config.min_text_chars)
    }

    /// Builds a processor with an explicit binary chain
    pub fn with_extractors(
        extractors: Vec<Box<dyn BinaryExtractor>>,
        min_text_chars: usize,
    ) -> Self {
        Self {
            extractors,
            min_text_chars,
        }
    }

    /// Names of the binary extractors, in the order they are tried
    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// Extracts text, or `None` if nothing usable came out
    pub async fn extract_text(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Option<String> {
        self.extract_with_report(bytes, filename, content_type)
            .await
            .text
    }

    /// Extracts text and reports what each extractor did
    pub async fn extract_with_report(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> ExtractionReport {
        let kind = classify_content(content_type, filename, bytes);

        let mut report = ExtractionReport {
            kind,
            text: None,
            attempts: Vec::new(),
        };

        match kind {
            ContentKind::Html => {
                let html = String::from_utf8_lossy(bytes);
                let text = html_to_text(&html);
                report.attempts.push(attempt("html", text.as_deref()));
                report.text = text;
            }
            ContentKind::Text => {
                let text = String::from_utf8_lossy(bytes).trim().to_string();
                let text = (!text.is_empty()).then_some(text);
                report.attempts.push(attempt("plain-text", text.as_deref()));
                report.text = text;
            }
            ContentKind::Pdf | ContentKind::Document => {
                self.run_binary_chain(bytes, filename, &mut report).await;
            }
            ContentKind::Unsupported => {
                debug!("No extractor for {} ({})", filename, content_type);
            }
        }

        report
    }

    async fn run_binary_chain(&self, bytes: &[u8], filename: &str, report: &mut ExtractionReport) {
        for extractor in &self.extractors {
            let outcome = match extractor.extract(bytes, filename).await {
                Ok(text) => {
                    let text = text.trim();
                    if text.chars().filter(|c| !c.is_whitespace()).count() < self.min_text_chars {
                        AttemptOutcome::Empty
                    } else {
                        report.text = Some(text.to_string());
                        AttemptOutcome::Extracted {
                            chars: text.chars().count(),
                        }
                    }
                }
                Err(reason) => {
                    debug!("{} failed on {}: {}", extractor.name(), filename, reason);
                    AttemptOutcome::Failed(reason)
                }
            };

            report.attempts.push(ExtractionAttempt {
                extractor: extractor.name(),
                outcome,
            });

            if report.text.is_some() {
                return;
            }
        }

        warn!("All extractors failed for {}: {}", filename, report.summary());
    }
}

impl fmt::Debug for DocumentProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentProcessor")
            .field("extractors", &self.extractor_names())
            .field("min_text_chars", &self.min_text_chars)
            .finish()
    }
}

fn attempt(extractor: &'static str, text: Option<&str>) -> ExtractionAttempt {
    ExtractionAttempt {
        extractor,
        outcome: match text {
            Some(t) => AttemptOutcome::Extracted {
                chars: t.chars().count(),
            },
            None => AttemptOutcome::Empty,
        },
    }
}
