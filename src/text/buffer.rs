//! Text buffer contract
//!
//! The buffer that holds the markup belongs to the host editor. The engine
//! only needs to read the text and move the cursor.

use super::cursor::{floor_char_boundary, TextPos};
use serde::{Deserialize, Serialize};

/// Core text buffer trait
///
/// Offsets are bytes into `value()`.
pub trait TextBuffer {
    /// Current markup text
    fn value(&self) -> &str;

    fn cursor_offset(&self) -> usize;

    fn set_cursor_offset(&mut self, offset: usize);

    /// Cursor as line/column
    fn cursor_pos(&self) -> TextPos {
        TextPos::from_offset(self.value(), self.cursor_offset())
    }
}

/// String-backed buffer
///
/// Used natively (tests, tools) and as the mirror of the host editor in the
/// WASM facade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleBuffer {
    text: String,
    cursor: usize,
}

impl SimpleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: 0,
        }
    }

    /// Replace the whole text; the cursor stays where it was if still inside
    pub fn set_value(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = floor_char_boundary(&self.text, self.cursor);
    }
}

impl TextBuffer for SimpleBuffer {
    fn value(&self) -> &str {
        &self.text
    }

    fn cursor_offset(&self) -> usize {
        self.cursor
    }

    fn set_cursor_offset(&mut self, offset: usize) {
        self.cursor = floor_char_boundary(&self.text, offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_is_clamped() {
        let mut buf = SimpleBuffer::from_text("<mei/>");
        buf.set_cursor_offset(100);
        assert_eq!(buf.cursor_offset(), 6);
        buf.set_value("<m/>");
        assert_eq!(buf.cursor_offset(), 4);
        assert_eq!(buf.cursor_pos(), TextPos::new(0, 4));
    }
}
