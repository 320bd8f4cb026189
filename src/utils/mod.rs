//! Utility functions and helpers.

pub mod http;
pub mod url;

use unicode_segmentation::UnicodeSegmentation;

/// Collapse every whitespace run (including newlines) into a single space.
///
/// Scraped markup tends to carry indentation and line breaks inside text
/// nodes; stored postings never do.
pub fn sanitize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max` user-perceived characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.graphemes(true).take(max).collect()
}
