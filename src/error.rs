//! Error types for the synchronization core
//!
//! The first four variants are the locally handled kinds: they never reach the
//! user, the coordinator answers them with a reset, a retry or a no-op and a
//! log trace. The remaining variants report malformed input from outside.

use thiserror::Error;

/// Result alias used throughout the crate
pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// Identifier has no graphical counterpart on the current page
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// Requested page lies outside `1..=page_count`
    #[error("page {page} out of range (page count {page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },

    /// No navigation candidate in any direction
    #[error("navigation exhausted from {0}")]
    NavigationExhausted(String),

    /// An asynchronous response no longer matches the current context
    #[error("stale {channel} response (generation {generation})")]
    StaleResponse { channel: &'static str, generation: u64 },

    /// Markup is not well-formed XML
    #[error("markup parse error: {0}")]
    Markup(String),

    /// Rendered SVG could not be parsed
    #[error("svg parse error: {0}")]
    Svg(String),

    /// The same xml:id appears twice in one document
    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    /// Configuration could not be read
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    /// True for the kinds that are answered locally with a fallback
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SyncError::ElementNotFound(_)
                | SyncError::PageOutOfRange { .. }
                | SyncError::NavigationExhausted(_)
                | SyncError::StaleResponse { .. }
        )
    }
}

impl From<roxmltree::Error> for SyncError {
    fn from(e: roxmltree::Error) -> Self {
        SyncError::Markup(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        assert!(SyncError::ElementNotFound("n1".into()).is_recoverable());
        assert!(SyncError::PageOutOfRange { page: 4, page_count: 2 }.is_recoverable());
        assert!(!SyncError::Markup("eof".into()).is_recoverable());
        assert!(!SyncError::DuplicateIdentifier("n1".into()).is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = SyncError::PageOutOfRange { page: 4, page_count: 2 };
        assert_eq!(err.to_string(), "page 4 out of range (page count 2)");
    }
}
