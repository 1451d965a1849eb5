//! Character-offset helpers over paragraph content.
//!
//! All modifier offsets are in Unicode scalar values (chars), not bytes, so
//! every slice or splice of content goes through these helpers.

/// Placeholder char occupying the content position of an inline widget.
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

/// Length of `s` in chars.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Convert a char offset to a byte offset, clamping to the end of `s`.
pub fn char_to_byte(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}

/// Slice `s` by char offsets. Out-of-range bounds are clamped.
pub fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let start_byte = char_to_byte(s, start);
    let end_byte = char_to_byte(s, end.max(start));
    &s[start_byte..end_byte]
}

/// Replace the chars in `start..end` with `replacement`, returning what was removed.
pub fn splice(s: &mut String, start: usize, end: usize, replacement: &str) -> String {
    let start_byte = char_to_byte(s, start);
    let end_byte = char_to_byte(s, end.max(start));
    let removed = s[start_byte..end_byte].to_string();
    s.replace_range(start_byte..end_byte, replacement);
    removed
}

/// Number of whitespace-separated words.
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// `s` without widget placeholder chars.
pub fn plain_text(s: &str) -> String {
    s.chars().filter(|&c| c != OBJECT_REPLACEMENT).collect()
}

/// The first `max_chars` chars of `s` with surrounding whitespace trimmed.
pub fn lead_text(s: &str, max_chars: usize) -> String {
    let trimmed = s.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((byte, _)) => trimmed[..byte].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}
