/// Broad class of a response body, used to route extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Text,
    Pdf,
    /// Word and other office formats
    Document,
    Unsupported,
}

impl ContentKind {
    /// Returns true for payloads that go through the binary extractor chain
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Pdf | Self::Document)
    }
}

const DOCUMENT_TYPES: &[&str] = &[
    "application/msword",
    "application/vnd.openxmlformats-officedocument",
    "application/vnd.oasis.opendocument",
    "application/rtf",
];

const DOCUMENT_EXTENSIONS: &[&str] = &[".doc", ".docx", ".odt", ".rtf"];

/// Classifies a body from its content type, falling back to the file name
/// and the leading bytes when the header is missing or generic
pub fn classify_content(content_type: &str, filename: &str, bytes: &[u8]) -> ContentKind {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    let name = filename.to_ascii_lowercase();

    if mime.contains("html") {
        return ContentKind::Html;
    }
    if mime == "application/pdf" || bytes_look_like_pdf(bytes) {
        return ContentKind::Pdf;
    }
    if DOCUMENT_TYPES.iter().any(|t| mime.starts_with(t)) {
        return ContentKind::Document;
    }
    if mime == "text/plain" {
        return ContentKind::Text;
    }

    let generic = mime.is_empty() || mime == "application/octet-stream";
    if generic {
        if name.ends_with(".pdf") {
            return ContentKind::Pdf;
        }
        if DOCUMENT_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            return ContentKind::Document;
        }
        if bytes_look_like_html(bytes) || name.ends_with(".html") || name.ends_with(".htm") {
            return ContentKind::Html;
        }
        if name.ends_with(".txt") {
            return ContentKind::Text;
        }
    }

    ContentKind::Unsupported
}

/// Best-effort sniff for PDF bytes (magic header)
pub fn bytes_look_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

/// Best-effort sniff for HTML bytes
pub fn bytes_look_like_html(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let head: Vec<u8> = bytes[start..]
        .iter()
        .take(16)
        .map(|b| b.to_ascii_lowercase())
        .collect();

    head.starts_with(b"<!doctype html")
        || head.starts_with(b"<html")
        || head.starts_with(b"<head")
        || head.starts_with(b"<body")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_content_type() {
        assert_eq!(classify_content("text/html; charset=utf-8", "", b""), ContentKind::Html);
        assert_eq!(classify_content("application/xhtml+xml", "", b""), ContentKind::Html);
        assert_eq!(classify_content("application/pdf", "", b""), ContentKind::Pdf);
        assert_eq!(classify_content("text/plain", "", b""), ContentKind::Text);
        assert_eq!(
            classify_content(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "",
                b""
            ),
            ContentKind::Document
        );
        assert_eq!(classify_content("image/png", "logo.png", b""), ContentKind::Unsupported);
    }

    #[test]
    fn test_classify_generic_by_filename() {
        assert_eq!(
            classify_content("application/octet-stream", "dpa.PDF", b""),
            ContentKind::Pdf
        );
        assert_eq!(classify_content("", "terms.docx", b""), ContentKind::Document);
        assert_eq!(classify_content("", "notice.txt", b""), ContentKind::Text);
    }

    #[test]
    fn test_classify_sniffs_bytes() {
        assert_eq!(
            classify_content("application/octet-stream", "download", b"%PDF-1.7\n..."),
            ContentKind::Pdf
        );
        assert_eq!(
            classify_content("", "", b"\n  <!DOCTYPE html><html></html>"),
            ContentKind::Html
        );
    }

    #[test]
    fn test_binary_kinds() {
        assert!(ContentKind::Pdf.is_binary());
        assert!(ContentKind::Document.is_binary());
        assert!(!ContentKind::Html.is_binary());
    }
}
