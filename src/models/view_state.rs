//! View state shared by the synchronization components
//!
//! Each part has one owner: `PageState` belongs to the pagination engine,
//! `SelectionState` to the cursor synchronizer and `PlaybackCursor` to the
//! playback synchronizer. Everything else reads them through `ViewState`.

use crate::models::document::BreakKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BreakPolicy {
    None,
    Measure,
    Line,
    #[serde(alias = "encoded")]
    EncodedLineAndPage,
    Smart,
    #[default]
    Auto,
}

impl BreakPolicy {
    /// Whether a break marker of `kind` starts a new page under this policy
    ///
    /// `Auto` counts no markers: its pages come from the `PageBreakMap`.
    pub fn counts(self, kind: BreakKind) -> bool {
        match self {
            BreakPolicy::None | BreakPolicy::Auto => false,
            BreakPolicy::Measure => kind == BreakKind::Page,
            BreakPolicy::Line | BreakPolicy::EncodedLineAndPage | BreakPolicy::Smart => true,
        }
    }
}

/// Page number -> identifier of the last element on that page
///
/// Produced by a full (non-speed) render; JSON keys are page numbers as
/// strings, as the engine sends them.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct PageBreakMap(pub BTreeMap<u32, String>);

impl PageBreakMap {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn page_count(&self) -> u32 {
        self.0.keys().next_back().copied().unwrap_or(1).max(1)
    }

    pub fn last_on(&self, page: u32) -> Option<&str> {
        self.0.get(&page).map(String::as_str)
    }
}

/// Selected identifiers in insertion order, plus the navigation anchor
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    ids: Vec<String>,
    anchor: Option<String>,
}

impl SelectionState {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn first(&self) -> Option<&str> {
        self.ids.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Append unless already selected
    pub(crate) fn push(&mut self, id: &str) {
        if !self.contains(id) {
            self.ids.push(id.to_string());
        }
    }

    pub(crate) fn replace(&mut self, id: &str) {
        self.ids.clear();
        self.ids.push(id.to_string());
    }

    pub(crate) fn set_anchor(&mut self, id: Option<&str>) {
        self.anchor = id.map(str::to_string);
    }

    pub(crate) fn clear(&mut self) {
        self.ids.clear();
        self.anchor = None;
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PageState {
    pub(crate) current: u32,
    /// `None` until the first count (shown as "?")
    pub(crate) count: Option<u32>,
    pub(crate) policy: BreakPolicy,
    pub(crate) break_map: PageBreakMap,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            current: 1,
            count: None,
            policy: BreakPolicy::default(),
            break_map: PageBreakMap::default(),
        }
    }
}

impl PageState {
    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn count(&self) -> Option<u32> {
        self.count
    }

    pub fn policy(&self) -> BreakPolicy {
        self.policy
    }

    pub fn break_map(&self) -> &PageBreakMap {
        &self.break_map
    }
}

/// Position in the timemap during playback
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct PlaybackCursor {
    pub(crate) index: usize,
    pub(crate) last_reported_time: f64,
    /// Bumped by every seek; scheduled tasks of older generations are void
    pub(crate) generation: u64,
}

impl PlaybackCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn last_reported_time(&self) -> f64 {
        self.last_reported_time
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Read-only snapshot of the state owned by the coordinator's components
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub pages: PageState,
    pub selection: SelectionState,
    pub playback: PlaybackCursor,
    pub markup_version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_kinds() {
        assert!(!BreakPolicy::None.counts(BreakKind::Page));
        assert!(BreakPolicy::Measure.counts(BreakKind::Page));
        assert!(!BreakPolicy::Measure.counts(BreakKind::System));
        assert!(BreakPolicy::Line.counts(BreakKind::System));
        assert!(!BreakPolicy::Auto.counts(BreakKind::Page));
    }

    #[test]
    fn test_policy_names() {
        let p: BreakPolicy = serde_json::from_str("\"encoded\"").unwrap();
        assert_eq!(p, BreakPolicy::EncodedLineAndPage);
        assert_eq!(serde_json::to_string(&BreakPolicy::EncodedLineAndPage).unwrap(), "\"encoded-line-and-page\"");
    }

    #[test]
    fn test_page_break_map_from_engine_json() {
        let map: PageBreakMap = serde_json::from_str(r#"{"1": "m-4", "2": "m-9", "3": "m-12"}"#).unwrap();
        assert_eq!(map.page_count(), 3);
        assert_eq!(map.last_on(2), Some("m-9"));
        assert_eq!(PageBreakMap::default().page_count(), 1);
    }

    #[test]
    fn test_selection_keeps_order_without_duplicates() {
        let mut sel = SelectionState::default();
        sel.push("a");
        sel.push("b");
        sel.push("a");
        assert_eq!(sel.ids(), &["a".to_string(), "b".to_string()]);
        sel.replace("c");
        assert_eq!(sel.ids(), &["c".to_string()]);
        sel.set_anchor(Some("c"));
        sel.clear();
        assert!(sel.is_empty());
        assert_eq!(sel.anchor(), None);
    }
}
