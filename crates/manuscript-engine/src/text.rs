//! Character offset helpers.
//!
//! Annotation offsets count Unicode scalar values. Rust strings and the
//! rope buffer are indexed by bytes, so every slice goes through here.

use xi_rope::Rope;

/// Number of characters in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the `char_idx`-th character, or `text.len()` when
/// `char_idx` is exactly the character length. `None` past the end.
pub fn char_to_byte(text: &str, char_idx: usize) -> Option<usize> {
    text.char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .nth(char_idx)
}

/// Slice `text` by a character range, clamping the end to the text.
/// Returns `None` when the range starts past the end or is empty.
pub fn slice_chars(text: &str, start: usize, end: usize) -> Option<&str> {
    if start >= end {
        return None;
    }
    let start_byte = char_to_byte(text, start)?;
    let end_byte = char_to_byte(text, end).unwrap_or(text.len());
    if start_byte >= end_byte {
        return None;
    }
    Some(&text[start_byte..end_byte])
}

/// Number of characters in the rope
pub fn rope_char_len(rope: &Rope) -> usize {
    rope.iter_chunks(0..rope.len())
        .map(|chunk| chunk.chars().count())
        .sum()
}

/// Byte offset in the rope of the `char_idx`-th character
pub fn rope_char_to_byte(rope: &Rope, char_idx: usize) -> Option<usize> {
    let mut chars_seen = 0;
    let mut bytes_seen = 0;

    for chunk in rope.iter_chunks(0..rope.len()) {
        let chunk_chars = chunk.chars().count();
        if char_idx < chars_seen + chunk_chars {
            return char_to_byte(chunk, char_idx - chars_seen).map(|b| bytes_seen + b);
        }
        chars_seen += chunk_chars;
        bytes_seen += chunk.len();
    }

    (char_idx == chars_seen).then_some(bytes_seen)
}
