//! PDF text extraction.

use std::path::Path;

use scriptlens_core::{Error, Result};
use tracing::{debug, warn};

/// Page separator emitted by `pdf-extract`.
const PAGE_BREAK: char = '\x0C';

/// Check whether a path has a `.pdf` extension (case-insensitive).
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Extract the text of a PDF file.
pub fn extract_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let text = extract_text_from_bytes(&bytes)
        .map_err(|e| Error::Extraction(format!("{}: {}", path.display(), e)))?;
    debug!("Extracted {} chars from {}", text.chars().count(), path.display());
    Ok(text)
}

/// Extract the text of an in-memory PDF.
pub fn extract_text_from_bytes(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed documents
    let raw = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| Error::Extraction("PDF parser panicked".to_string()))?
        .map_err(|e| Error::Extraction(e.to_string()))?;
    Ok(join_pages(&raw))
}

/// Extract text, logging failures and returning an empty string instead.
pub fn extract_text_lossy(path: &Path) -> String {
    match extract_text(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Text extraction failed: {}", e);
            String::new()
        }
    }
}

/// Join the non-empty pages of raw extractor output with `\n`, in page order.
pub fn join_pages(raw: &str) -> String {
    raw.split(PAGE_BREAK)
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
