//! Score Sync WASM API
//!
//! The JavaScript-facing surface: the stateful `SyncEngine` class plus a few
//! stateless pagination functions for the rendering worker.
//!
//! # Module Structure
//!
//! - `helpers`: console logging, serialization and error conversion
//! - `engine`: the `SyncEngine` class
//! - `pages`: `computePageCount` / `extractPage`

pub mod helpers;
pub mod engine;
pub mod pages;

pub use engine::SyncEngine;
pub use pages::{compute_page_count, extract_page};
