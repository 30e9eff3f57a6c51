//! East-Asian display width measurement.
//!
//! Every wrap/height computation in this crate goes through
//! [`str_width`]/[`char_width`] rather than calling `unicode_width` directly,
//! so the width policy stays in one place. Unlike the teacher's
//! `core-text::width::egc_width` (which carries a generated override table
//! and emoji classifier tuned for exact terminal rendering of an editor
//! buffer), this is deliberately the simple case: a log line's wrap point
//! only needs to know "does this character take one cell or two."

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width, in terminal cells, of a single character.
pub fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Display width, in terminal cells, of a grapheme cluster.
pub fn grapheme_width(g: &str) -> usize {
    UnicodeWidthStr::width(g)
}

/// Total display width of `s`, summed grapheme cluster by grapheme cluster.
/// ANSI escape sequences are not stripped here; callers that need
/// width-excluding-escapes should measure the already-unescaped text.
pub fn str_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_width).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_single_width() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(str_width("hello"), 5);
    }

    #[test]
    fn wide_cjk_character_counts_double() {
        assert_eq!(char_width('中'), 2);
        assert_eq!(str_width("中文"), 4);
    }

    #[test]
    fn control_characters_have_zero_width() {
        assert_eq!(char_width('\u{0}'), 0);
    }
}
