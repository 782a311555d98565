//! Character-safe text helpers.

/// Keep at most `max_chars` characters of `text`.
///
/// Counts Unicode scalar values, so CJK and other multi-byte text is never
/// split inside a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_chars("Gui Zhi", 500), "Gui Zhi");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn truncates_ascii() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }

    #[test]
    fn truncates_by_characters_not_bytes() {
        let text = "麻黄汤桂枝汤";
        assert_eq!(truncate_chars(text, 3), "麻黄汤");
        assert_eq!(truncate_chars(text, 3).chars().count(), 3);
    }
}
