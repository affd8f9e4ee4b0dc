//! Text side of the synchronization
//!
//! The markup text and its cursor live in the host's editor widget. This
//! module defines what the engine needs from it and a string-backed
//! implementation.
//!
//! ## Modules
//!
//! - `buffer`: the `TextBuffer` contract and `SimpleBuffer`
//! - `cursor`: line/column positions

pub mod buffer;
pub mod cursor;

// Re-exports for convenience
pub use buffer::{SimpleBuffer, TextBuffer};
pub use cursor::TextPos;
