//! Line/column positions over markup text
//!
//! The engine works in byte offsets; hosts that address text by line and
//! column (most editor widgets) convert through `TextPos`.

use serde::{Deserialize, Serialize};

/// A position in text (line, column), both 0-based; columns count chars
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TextPos {
    pub line: usize,
    pub col: usize,
}

impl TextPos {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// Position of a byte offset; offsets past the end map to the end
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let offset = floor_char_boundary(text, offset);
        let before = &text[..offset];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Self {
            line,
            col: before[line_start..].chars().count(),
        }
    }

    /// Byte offset of this position, clamped to the line end and text end
    pub fn to_offset(self, text: &str) -> usize {
        let mut line_start = 0;
        for _ in 0..self.line {
            match text[line_start..].find('\n') {
                Some(i) => line_start += i + 1,
                None => return text.len(),
            }
        }
        let line_text = text[line_start..].split('\n').next().unwrap_or_default();
        let col_bytes = line_text
            .char_indices()
            .nth(self.col)
            .map_or(line_text.len(), |(i, _)| i);
        line_start + col_bytes
    }
}

/// Largest char boundary not above `offset`
pub(crate) fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
