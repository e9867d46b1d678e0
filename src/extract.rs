//! Plain-text extraction for ingested documents (PDF, text, Markdown).
//!
//! Extraction is pipeline-layer: ingestion supplies bytes + content-type;
//! this module returns plain UTF-8 text with line breaks flattened to
//! spaces, which is the form stored as an embedding key.

use std::path::Path;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_MARKDOWN: &str = "text/markdown";

/// Extraction error. Ingestion logs it and skips the document.
#[derive(Debug)]
pub enum ExtractError {
    UnsupportedContentType(String),
    Pdf(String),
    Utf8(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnsupportedContentType(ct) => {
                write!(f, "unsupported content-type: {}", ct)
            }
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Utf8(e) => write!(f, "text is not valid UTF-8: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Guess the content-type from a file extension.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(MIME_PDF),
        "txt" | "text" => Some(MIME_TEXT),
        "md" | "markdown" => Some(MIME_MARKDOWN),
        _ => None,
    }
}

/// Extract text from `bytes`, reading at most `max_pages` PDF pages.
pub fn extract_text(
    bytes: &[u8],
    content_type: &str,
    max_pages: Option<usize>,
) -> Result<String, ExtractError> {
    let raw = match content_type {
        MIME_PDF => extract_pdf(bytes, max_pages)?,
        MIME_TEXT | MIME_MARKDOWN => std::str::from_utf8(bytes)
            .map_err(|e| ExtractError::Utf8(e.to_string()))?
            .to_string(),
        _ => {
            return Err(ExtractError::UnsupportedContentType(
                content_type.to_string(),
            ))
        }
    };
    Ok(flatten_lines(&raw))
}

fn extract_pdf(bytes: &[u8], max_pages: Option<usize>) -> Result<String, ExtractError> {
    match max_pages {
        None => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
        }
        Some(limit) => {
            let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
                .map_err(|e| ExtractError::Pdf(e.to_string()))?;
            Ok(pages.into_iter().take(limit).collect::<Vec<_>>().join(" "))
        }
    }
}

/// Replace line breaks with spaces and trim the ends.
pub fn flatten_lines(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}
