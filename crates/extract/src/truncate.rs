//! Utilities for bounding extracted text.

/// Truncates `text` to at most `max_chars` characters.
///
/// Lengths throughout extraction are measured in characters rather than
/// bytes, so a cut never lands inside a multi-byte sequence such as the `é`
/// of `Genève`.
///
/// # Examples
///
/// ```rust
/// use jobimport_extract::truncate_chars;
/// assert_eq!(truncate_chars("Genève", 4), "Genè");
/// assert_eq!(truncate_chars("Genève", 100), "Genève");
/// ```
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
