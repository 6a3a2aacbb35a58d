use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize raw transaction text for matching.
///
/// Applies NFKD compatibility decomposition, lowercases, and keeps only
/// ASCII letters, digits, and `@`. Everything else (punctuation, combining
/// marks, whitespace of any kind) collapses into a single space; leading
/// and trailing runs are dropped entirely. Idempotent and infallible.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.nfkd().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '@' {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            out.push(ch);
            pending_space = false;
        } else {
            pending_space = true;
        }
    }

    out
}

// Payment-address shape: 2+ chars on each side of the `@`.
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9._-]{2,})@([a-z0-9_-]{2,})").unwrap());

/// Extract the local part of the first (leftmost) `local@domain` shaped
/// token, or `None` when the text contains no such token.
pub fn extract_identifier(text: &str) -> Option<&str> {
    IDENTIFIER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
