//! Zero-width space helpers.
//!
//! The editor parks the caret in otherwise empty inline nodes with U+200B, so "empty" text
//! throughout the engine means empty or zero-width-only.

pub const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// True for `""` and for strings made only of zero-width spaces.
pub fn only_zero_width_space(text: &str) -> bool {
    text.chars().all(|c| c == ZERO_WIDTH_SPACE)
}

/// `text` with every zero-width space removed. Borrows when there is nothing to strip.
pub fn strip_zero_width(text: &str) -> std::borrow::Cow<'_, str> {
    if text.contains(ZERO_WIDTH_SPACE) {
        std::borrow::Cow::Owned(text.replace(ZERO_WIDTH_SPACE, ""))
    } else {
        std::borrow::Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_zero_width_space_accepts_empty_and_zwsp_runs() {
        assert!(only_zero_width_space(""));
        assert!(only_zero_width_space("\u{200B}\u{200B}"));
        assert!(!only_zero_width_space(" "));
        assert!(!only_zero_width_space("\u{200B}a"));
    }

    #[test]
    fn strip_zero_width_borrows_clean_text() {
        assert!(matches!(strip_zero_width("abc"), std::borrow::Cow::Borrowed("abc")));
        assert_eq!(strip_zero_width("a\u{200B}b\u{200B}"), "ab");
    }
}
