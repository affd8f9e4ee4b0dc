//! Coordinate model shared by the synchronization components
//!
//! Three coordinate systems meet here: the markup (`document`), the rendered
//! page (`rendered`) and playback time (`timemap`). `view_state` holds the
//! small amount of mutable state the components own.

pub mod document;
pub mod rendered;
pub mod timemap;
pub mod view_state;

// Re-export commonly used types
pub use document::{BreakKind, DocNode, Document, NodeId, NodeKind};
pub use rendered::{Anchor, RenderedElement, RenderedTree};
pub use timemap::{ExpansionAliasMap, TimePoint, Timemap};
pub use view_state::{BreakPolicy, PageBreakMap, PageState, PlaybackCursor, SelectionState, ViewState};
