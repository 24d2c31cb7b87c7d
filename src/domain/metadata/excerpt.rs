//! Text excerpts from the first pages of an uploaded PDF.

use lopdf::Document;
use tracing::debug;

/// Excerpt used when the document yields no text (scanned covers, broken files).
pub const PLACEHOLDER_EXCERPT: &str = "Sample text from PDF: Grade 3 Math Book, First Semester";

/// Extracts the text of the first `pages` pages, capped at `max_chars` characters.
///
/// Returns `None` if the bytes are not a readable PDF or no text comes out.
pub fn extract_excerpt(pdf: &[u8], pages: usize, max_chars: usize) -> Option<String> {
    let document = match Document::load_mem(pdf) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(error = %e, "excerpt: not a readable PDF");
            return None;
        }
    };

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().take(pages).collect();
    if page_numbers.is_empty() {
        return None;
    }

    let text = match document.extract_text(&page_numbers) {
        Ok(t) => t,
        Err(e) => {
            debug!(error = %e, "excerpt: text extraction failed");
            return None;
        }
    };

    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return None;
    }
    Some(normalized.chars().take(max_chars).collect())
}

/// Excerpt for the language model, falling back to [`PLACEHOLDER_EXCERPT`].
pub fn excerpt_or_placeholder(pdf: &[u8], pages: usize, max_chars: usize) -> String {
    extract_excerpt(pdf, pages, max_chars).unwrap_or_else(|| PLACEHOLDER_EXCERPT.to_string())
}
