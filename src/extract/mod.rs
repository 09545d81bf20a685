//! Document text extraction
//!
//! # Components
//!
//! - `content`: classifies a response body as HTML, plain text, PDF, or
//!   another document type
//! - `html`: HTML to clean text through markdown conversion and flattening
//! - `binary`: the ordered extractor chain for PDF and office documents
//! - `processor`: `DocumentProcessor`, the single entry point used by the fetcher
//!
//! Extraction never fails past `DocumentProcessor`: an extractor that errors
//! or panics is recorded as an attempt with no text and the chain moves on.

mod binary;
mod content;
mod html;
mod processor;

pub use binary::{BinaryExtractor, PdfExtractExtractor, PdftotextExtractor, ServiceExtractor};
pub use content::{bytes_look_like_html, bytes_look_like_pdf, classify_content, ContentKind};
pub use html::{flatten_markdown, html_to_text};
pub use processor::{AttemptOutcome, DocumentProcessor, ExtractionAttempt, ExtractionReport};
