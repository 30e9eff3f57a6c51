//! ANSI-aware word wrap.
//!
//! A close port of `WrapString` in
//! `examples/original_source/internal/logs/pipeline/pipeline.go`: escape
//! sequences are passed through verbatim and contribute zero width, the most
//! recently seen sequence is re-emitted at the start of each wrapped line,
//! and a break is taken before a word (run of non-space, non-wide runes
//! ending in whitespace or a wide character) that would overflow `width`.

use crate::width::char_width;

/// Wrap `input` to `width` display columns. `width <= 0` disables wrapping
/// entirely (spec.md §4.4, §8 boundary behavior).
pub fn wrap(input: &str, width: i64) -> String {
    if width <= 0 {
        return input.to_string();
    }
    let width = width as usize;

    let mut result = String::new();
    let mut current_line = String::new();
    let mut current_line_width = 0usize;
    let mut word_buffer = String::new();
    let mut word_width = 0usize;
    let mut in_escape = false;
    let mut escape_buffer = String::new();
    let mut last_escape = String::new();

    for ch in input.chars() {
        if ch == '\u{1b}' {
            in_escape = true;
        }
        if in_escape {
            escape_buffer.push(ch);
            word_buffer.push(ch);
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
            continue;
        }
        if !escape_buffer.is_empty() {
            last_escape = std::mem::take(&mut escape_buffer);
        }

        if ch == '\n' {
            current_line.push_str(&word_buffer);
            result.push_str(&current_line);
            result.push('\n');
            current_line.clear();
            current_line.push_str(&last_escape);
            word_buffer.clear();
            current_line_width = 0;
            word_width = 0;
            continue;
        }

        word_buffer.push(ch);
        let cw = char_width(ch);
        word_width += cw;

        if ch.is_whitespace() || cw > 1 {
            if current_line_width + word_width > width {
                result.push_str(&current_line);
                result.push('\n');
                current_line.clear();
                current_line.push_str(&last_escape);
                current_line_width = 0;
            }
            current_line.push_str(&word_buffer);
            current_line_width += word_width;
            word_buffer.clear();
            word_width = 0;
        }
    }

    if !word_buffer.is_empty() {
        if current_line_width + word_width > width {
            result.push_str(&current_line);
            result.push('\n');
            current_line.clear();
            current_line.push_str(&last_escape);
        }
        current_line.push_str(&word_buffer);
    }
    if !current_line.is_empty() {
        result.push_str(&current_line);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_wrap_when_width_non_positive() {
        let s = "a very long line that would otherwise wrap";
        assert_eq!(wrap(s, 0), s);
        assert_eq!(wrap(s, -5), s);
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let out = wrap("the quick brown fox", 10);
        assert!(out.lines().all(|l| crate::width::str_width(l) <= 10));
        assert_eq!(out.replace('\n', " "), "the quick brown fox");
    }

    #[test]
    fn literal_newline_forces_a_break() {
        let out = wrap("one\ntwo", 80);
        assert_eq!(out, "one\ntwo");
    }

    #[test]
    fn ansi_color_survives_a_wrap_and_is_reapplied() {
        // S4: "\x1b[31mlorem ipsum dolor sit amet\x1b[0m" wrapped to width 11.
        let input = "\x1b[31mlorem ipsum dolor sit amet\x1b[0m";
        let out = wrap(input, 11);
        let lines: Vec<&str> = out.split('\n').collect();
        assert!(lines.len() >= 2);
        for line in &lines {
            assert!(line.starts_with("\x1b[31m") || line.starts_with("\x1b[0m"));
        }
    }

    #[test]
    fn wide_characters_count_as_two_columns_toward_the_limit() {
        let out = wrap("中中中中中中", 6);
        for line in out.lines() {
            assert!(crate::width::str_width(line) <= 6);
        }
    }
}
