//! Score Sync WASM Module
//!
//! Keeps a score's markup text, its rendered pages and its playback in step:
//! pagination of the markup, spatial keyboard navigation over the rendered
//! notation, two-way selection sync between text and rendering, and
//! note highlighting during playback.

pub mod config;
pub mod error;
pub mod models;
pub mod text;
pub mod pagination;
pub mod navigation;
pub mod sync;
pub mod playback;
pub mod engine;
pub mod api;

// Re-export commonly used types
pub use config::SyncConfig;
pub use engine::{Effect, Notification, SyncCoordinator};
pub use error::{SyncError, SyncResult};
pub use models::*;

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    if console_log::init_with_level(log::Level::Debug).is_err() {
        log::warn!("logger already initialized");
    }

    log::info!("Score sync WASM module initialized");
}
