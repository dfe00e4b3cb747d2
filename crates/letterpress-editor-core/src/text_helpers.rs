//! Text navigation helpers over a block's inline content.
//!
//! These work with the `CharSource` trait so word boundaries can be found
//! without materializing the block's text.

use crate::inline::Inline;

/// Char-indexed read access to a run of text.
pub trait CharSource {
    fn char_at(&self, offset: usize) -> Option<char>;
    fn len_chars(&self) -> usize;
}

impl CharSource for Inline {
    fn char_at(&self, offset: usize) -> Option<char> {
        Inline::char_at(self, offset)
    }

    fn len_chars(&self) -> usize {
        self.len()
    }
}

impl CharSource for str {
    fn char_at(&self, offset: usize) -> Option<char> {
        self.chars().nth(offset)
    }

    fn len_chars(&self) -> usize {
        self.chars().count()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Find word boundary backward from cursor.
pub fn find_word_boundary_backward<D: CharSource + ?Sized>(doc: &D, cursor: usize) -> usize {
    if cursor == 0 {
        return 0;
    }

    let mut pos = cursor.min(doc.len_chars());

    // Skip any whitespace/punctuation immediately before cursor.
    while pos > 0 {
        match doc.char_at(pos - 1) {
            Some(c) if is_word_char(c) => break,
            Some(_) => pos -= 1,
            None => break,
        }
    }

    // Skip the word characters.
    while pos > 0 {
        match doc.char_at(pos - 1) {
            Some(c) if is_word_char(c) => pos -= 1,
            _ => break,
        }
    }

    pos
}

/// Find word boundary forward from cursor.
pub fn find_word_boundary_forward<D: CharSource + ?Sized>(doc: &D, cursor: usize) -> usize {
    let len = doc.len_chars();
    if cursor >= len {
        return len;
    }

    let mut pos = cursor;

    // Skip word characters first.
    while pos < len {
        match doc.char_at(pos) {
            Some(c) if is_word_char(c) => pos += 1,
            _ => break,
        }
    }

    // Then skip whitespace/punctuation.
    while pos < len {
        match doc.char_at(pos) {
            Some(c) if is_word_char(c) => break,
            Some(_) => pos += 1,
            None => break,
        }
    }

    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_word_boundary_backward() {
        let text = "hello world test";

        assert_eq!(find_word_boundary_backward(text, 16), 12); // from end
        assert_eq!(find_word_boundary_backward(text, 12), 6); // from "test"
        assert_eq!(find_word_boundary_backward(text, 8), 6); // inside "world"
        assert_eq!(find_word_boundary_backward(text, 0), 0);
    }

    #[test]
    fn test_find_word_boundary_forward() {
        let text = "hello world test";

        assert_eq!(find_word_boundary_forward(text, 0), 6);
        assert_eq!(find_word_boundary_forward(text, 6), 12);
        assert_eq!(find_word_boundary_forward(text, 14), 16);
        assert_eq!(find_word_boundary_forward(text, 16), 16);
    }

    #[test]
    fn test_boundaries_over_inline() {
        let inline = Inline::plain("snake_case, ok");
        assert_eq!(find_word_boundary_backward(&inline, 12), 0);
        assert_eq!(find_word_boundary_forward(&inline, 0), 12);
    }
}
