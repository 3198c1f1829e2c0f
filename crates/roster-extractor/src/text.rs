//! Small text helpers shared by the extractors

use regex::Regex;

/// Largest char boundary at or below `idx`
pub(crate) fn floor_boundary(text: &str, idx: usize) -> usize {
    let mut i = idx.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest char boundary at or above `idx`
pub(crate) fn ceil_boundary(text: &str, idx: usize) -> usize {
    let mut i = idx.min(text.len());
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// `text[from..to]` with both ends snapped to char boundaries
pub(crate) fn slice(text: &str, from: usize, to: usize) -> &str {
    let start = floor_boundary(text, from);
    let end = ceil_boundary(text, to).max(start);
    &text[start..end]
}

/// Up to `window` bytes either side of `position`, on one line
pub(crate) fn context_window(text: &str, position: usize, window: usize) -> String {
    slice(text, position.saturating_sub(window), position + window)
        .replace('\n', " ")
        .trim()
        .to_string()
}

/// Span context: `before` bytes ahead of `start` through `after` bytes past `end`
pub(crate) fn span_context(text: &str, start: usize, end: usize, before: usize, after: usize) -> String {
    slice(text, start.saturating_sub(before), end + after).to_string()
}

/// Compile a static pattern table
pub(crate) fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid built-in pattern {p}: {e}")))
        .collect()
}

/// Keep only ASCII digits
pub(crate) fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_window_clamps() {
        assert_eq!(context_window("NPI:\n1234567893 for Dr. X", 5, 5), "NPI: 12345");
        assert_eq!(context_window("short", 2, 100), "short");
    }

    #[test]
    fn test_slice_respects_char_boundaries() {
        let text = "Shared Risk – AB12";
        let dash = text.find('–').unwrap();
        assert_eq!(slice(text, dash + 1, dash + 2), "–");
    }

    #[test]
    fn test_digits() {
        assert_eq!(digits("(555) 123-4567"), "5551234567");
    }
}
