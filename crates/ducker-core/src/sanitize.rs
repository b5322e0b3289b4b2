//! Text shaping for outbound messages.
//!
//! - Bounding model output to a fixed number of characters
//! - Cleaning display names before they are announced in a group

/// Punctuation kept in display names.
const NAME_PUNCTUATION: [char; 6] = ['-', '_', '.', ',', '!', '?'];

/// Cut `text` to at most `bound` characters, appending `marker` when cut.
///
/// Counts characters, not bytes, so multi-byte text is never split.
pub fn truncate(text: &str, bound: usize, marker: &str) -> String {
    match text.char_indices().nth(bound) {
        Some((idx, _)) => format!("{}{marker}", &text[..idx]),
        None => text.to_string(),
    }
}

/// Keep letters (accented ones included), digits, whitespace, and a few
/// punctuation marks. Emoji and control characters are dropped.
pub fn clean_display_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || NAME_PUNCTUATION.contains(c))
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// A name that carries no information beyond a phone number.
pub fn is_numeric_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_digit())
}
