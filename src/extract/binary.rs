//! Binary document extractors
//!
//! Each extractor turns raw document bytes into text or an error message.
//! Errors are plain strings: the processor only records them as diagnostics
//! before trying the next extractor.

use super::content::bytes_look_like_pdf;
use async_trait::async_trait;
use serde::Deserialize;
use std::io::Write;
use std::process::Command;
use tracing::debug;

/// One step of the binary extraction chain
#[async_trait]
pub trait BinaryExtractor: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Extracts text from `bytes`
    ///
    /// `filename` is the last path segment of the source URL and may be empty.
    async fn extract(&self, bytes: &[u8], filename: &str) -> Result<String, String>;
}

/// In-process PDF extraction with `pdf-extract`
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractExtractor;

#[async_trait]
impl BinaryExtractor for PdfExtractExtractor {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    async fn extract(&self, bytes: &[u8], _filename: &str) -> Result<String, String> {
        if !bytes_look_like_pdf(bytes) {
            return Err("not a PDF".to_string());
        }

        // pdf-extract can panic on malformed input; the blocking task turns
        // that into a join error
        let owned = bytes.to_vec();
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&owned))
            .await
            .map_err(|e| format!("extractor panicked: {}", e))?
            .map_err(|e| e.to_string())
    }
}

/// Shells out to poppler's `pdftotext`
#[derive(Debug, Clone)]
pub struct PdftotextExtractor {
    binary: String,
}

impl PdftotextExtractor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl BinaryExtractor for PdftotextExtractor {
    fn name(&self) -> &'static str {
        "pdftotext"
    }

    async fn extract(&self, bytes: &[u8], _filename: &str) -> Result<String, String> {
        if !bytes_look_like_pdf(bytes) {
            return Err("not a PDF".to_string());
        }

        let binary = self.binary.clone();
        let owned = bytes.to_vec();
        tokio::task::spawn_blocking(move || run_pdftotext(&binary, &owned))
            .await
            .map_err(|e| format!("pdftotext task failed: {}", e))?
    }
}

fn run_pdftotext(binary: &str, bytes: &[u8]) -> Result<String, String> {
    let mut tmp = tempfile::Builder::new()
        .prefix("legal-scout-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| format!("tempfile: {}", e))?;
    tmp.write_all(bytes)
        .map_err(|e| format!("tempfile write: {}", e))?;
    let path = tmp.path().to_string_lossy().to_string();

    let output = Command::new(binary)
        .args(["-layout", "-nopgbrk", "-enc", "UTF-8", &path, "-"])
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => format!("{} not found", binary),
            _ => format!("failed to spawn {}: {}", binary, e),
        })?;

    if !output.status.success() {
        return Err(format!("{} exited with {}", binary, output.status));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Posts the document to an external extraction service
///
/// The service receives the raw bytes and answers either with JSON
/// (`{"text": "..."}`) or with the plain text itself.
#[derive(Debug, Clone)]
pub struct ServiceExtractor {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    text: Option<String>,
}

impl ServiceExtractor {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl BinaryExtractor for ServiceExtractor {
    fn name(&self) -> &'static str {
        "extraction-service"
    }

    async fn extract(&self, bytes: &[u8], filename: &str) -> Result<String, String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .header("X-Filename", filename)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("service returned HTTP {}", status.as_u16()));
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));
        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read response: {}", e))?;

        if is_json {
            let parsed: ServiceResponse =
                serde_json::from_str(&body).map_err(|e| format!("invalid JSON: {}", e))?;
            debug!("Extraction service returned JSON for {}", filename);
            Ok(parsed.text.unwrap_or_default())
        } else {
            Ok(body)
        }
    }
}
