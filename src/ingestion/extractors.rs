use crate::errors::{AppError, Result};
use lopdf::Document;

/// Text extracted from a single page
#[derive(Debug, Clone)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// Extract text from PDF bytes, returning only pages that carry a text layer
pub fn extract_pdf_pages(pdf_bytes: &[u8]) -> Result<Vec<PageText>> {
    let doc = Document::load_mem(pdf_bytes)
        .map_err(|e| AppError::BadRequest(format!("Failed to parse PDF document: {}", e)))?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys().copied() {
        match doc.extract_text(&[page_number]) {
            Ok(text) if !text.trim().is_empty() => pages.push(PageText {
                page_number,
                text: text.trim().to_string(),
            }),
            Ok(_) => {
                tracing::debug!(page_number, "Page has no text layer, skipping");
            }
            Err(e) => {
                tracing::warn!(page_number, error = ?e, "Failed to extract text from page");
            }
        }
    }

    if pages.is_empty() {
        // Some font encodings defeat per-page extraction; fall back to pdf-extract
        pages = extract_with_fallback(pdf_bytes);
    }

    Ok(pages)
}

/// Whole-document extraction, split on form feeds as a page-break heuristic
fn extract_with_fallback(pdf_bytes: &[u8]) -> Vec<PageText> {
    let text = match pdf_extract::extract_text_from_mem(pdf_bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Fallback PDF text extraction failed");
            return Vec::new();
        }
    };

    text.split('\u{000C}')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(idx, text)| PageText {
            page_number: (idx + 1) as u32,
            text: text.to_string(),
        })
        .collect()
}

/// Concatenate page texts; `None` when no page yielded any text
pub fn join_pages(pages: &[PageText]) -> Option<String> {
    if pages.is_empty() {
        return None;
    }

    Some(
        pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Extract the full text of a PDF, or `None` if it is unreadable or empty
pub fn extract_pdf_text(pdf_bytes: &[u8]) -> Option<String> {
    match extract_pdf_pages(pdf_bytes) {
        Ok(pages) => join_pages(&pages),
        Err(e) => {
            tracing::warn!(error = %e, "Could not extract text from PDF");
            None
        }
    }
}
