//! UTF-8 helpers for caret handling.

use std::borrow::Cow;

/// Clamp a byte index onto a char boundary, moving backwards if it lands mid-character.
#[inline]
pub(crate) fn clamp_to_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Previous char boundary before `i`, or 0.
pub(crate) fn prev_cursor_boundary(s: &str, i: usize) -> usize {
    let i = clamp_to_char_boundary(s, i);
    s[..i].char_indices().last().map(|(idx, _)| idx).unwrap_or(0)
}

/// Strip CR/LF; spinner inputs are single-line.
pub(crate) fn filter_single_line(s: &str) -> Cow<'_, str> {
    if s.contains(['\n', '\r']) {
        Cow::Owned(s.chars().filter(|&c| c != '\n' && c != '\r').collect())
    } else {
        Cow::Borrowed(s)
    }
}
