//! Text processing utilities.

/// Truncate `text` to at most `max_chars` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Character count as seen by request validation (Unicode scalar values, not bytes).
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("", 5), "");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello world", 5), "hello");
        assert_eq!(char_len(truncate_chars(&"x".repeat(9000), 8000)), 8000);
    }

    #[test]
    fn test_truncate_multibyte() {
        let text = "привет мир";
        assert_eq!(truncate_chars(text, 6), "привет");
        assert_eq!(char_len(text), 10);
    }
}
