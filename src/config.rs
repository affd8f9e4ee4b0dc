//! Runtime options for the synchronization core
//!
//! Every field has a default so a partial JSON/YAML document (or an empty JS
//! object) is a valid configuration.

use crate::error::{SyncError, SyncResult};
use crate::models::BreakPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Send only the current page's markup slice to the rendering engine
    pub speed_mode: bool,
    pub break_policy: BreakPolicy,
    /// Re-render after text edits
    pub live_update: bool,
    /// Load the page containing the element at the text cursor when it is off-page
    pub flip_to_cursor: bool,
    pub highlight_playing: bool,
    pub page_follow: bool,
    pub scroll_follow: bool,
    /// Quiet period between the last edit and the notation re-render (ms)
    pub render_debounce_ms: f64,
    /// Quiet period between the last edit and the timemap re-computation (ms)
    pub timemap_debounce_ms: f64,
    /// Timestamp tolerance for seeking and advancing (ms)
    pub seek_tolerance_ms: f64,
    /// Preferred `@source` when selecting readings inside apparatus groups
    pub source_id: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            speed_mode: true,
            break_policy: BreakPolicy::Auto,
            live_update: true,
            flip_to_cursor: true,
            highlight_playing: true,
            page_follow: true,
            scroll_follow: false,
            render_debounce_ms: 400.0,
            timemap_debounce_ms: 400.0,
            seek_tolerance_ms: 1.0,
            source_id: None,
        }
    }
}

impl SyncConfig {
    pub fn from_json(json: &str) -> SyncResult<Self> {
        serde_json::from_str(json).map_err(|e| SyncError::Config(e.to_string()))
    }

    pub fn from_yaml(yaml: &str) -> SyncResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> SyncResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&text),
            _ => Self::from_json(&text),
        }
    }

    /// Speed mode only matters when the policy actually splits the document
    pub fn paginates(&self) -> bool {
        self.speed_mode && self.break_policy != BreakPolicy::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SyncConfig::from_json(r#"{"breakPolicy": "line", "scrollFollow": true}"#).unwrap();
        assert_eq!(config.break_policy, BreakPolicy::Line);
        assert!(config.scroll_follow);
        assert!(config.speed_mode);
        assert_eq!(config.render_debounce_ms, 400.0);
    }

    #[test]
    fn test_yaml() {
        let config = SyncConfig::from_yaml("speedMode: false\nbreakPolicy: encoded-line-and-page\nsourceId: A\n").unwrap();
        assert!(!config.speed_mode);
        assert_eq!(config.break_policy, BreakPolicy::EncodedLineAndPage);
        assert_eq!(config.source_id.as_deref(), Some("A"));
        assert!(!config.paginates());
    }

    #[test]
    fn test_bad_policy_is_config_error() {
        let err = SyncConfig::from_json(r#"{"breakPolicy": "sometimes"}"#).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }
}
