use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use crate::extraction::ExtractError;

/// Extracts text from a PDF page by page, joining pages with a blank line.
///
/// A PDF whose pages carry no text (an image-only scan) is `EmptyContent`.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| ExtractError::CorruptDocument("PDF parser aborted on malformed input".to_string()))?
    .map_err(|e| ExtractError::CorruptDocument(format!("Failed to read PDF: {e}")))?;

    debug!(pages = pages.len(), "PDF text extracted");

    let text = join_pages(&pages);
    if text.trim().is_empty() {
        return Err(ExtractError::EmptyContent);
    }
    Ok(text)
}

fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim_end())
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
