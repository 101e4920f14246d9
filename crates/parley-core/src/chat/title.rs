//! Session title derivation.
//!
//! Titles come from the first user utterance: up to 50 characters verbatim,
//! longer text truncated with a `...` marker. Char-based so multibyte input
//! never splits mid-codepoint.

/// Maximum title length in characters before truncation.
const TITLE_MAX_CHARS: usize = 50;

/// Marker appended when the title was truncated.
const ELLIPSIS: &str = "...";

/// Derive a session title from the first user message.
pub fn derive_title(text: &str) -> String {
    if text.chars().count() <= TITLE_MAX_CHARS {
        text.to_string()
    } else {
        let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
        title.push_str(ELLIPSIS);
        title
    }
}
