//! Cursor and selection synchronization
//!
//! Mirrors the text cursor and the graphical selection in both directions.
//! Every cursor move carries an `Origin`; moves the synchronizer made itself
//! come back tagged `Origin::Synchronizer` and are ignored, which breaks the
//! click -> cursor -> selection loop without a mutable guard flag.

mod highlight;

pub use highlight::{HighlightChange, HighlightSet};

use crate::error::SyncError;
use crate::models::{Document, NodeKind, RenderedTree, SelectionState};
use serde::{Deserialize, Serialize};

/// Who moved the text cursor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Synchronizer,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Modifiers {
    /// Add to the selection instead of replacing it (ctrl/meta)
    pub multi_select: bool,
    /// Select the enclosing chord instead of the note (alt)
    pub chord: bool,
}

/// Result of a click on the rendering
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClickOutcome {
    /// Identifier actually selected
    pub selected: String,
    /// Where the text cursor goes; `None` when the markup lacks the element
    pub cursor_offset: Option<usize>,
}

/// Result of a highlight refresh
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightUpdate {
    pub change: HighlightChange,
    /// First wanted identifier that is not on the current page
    pub missing: Option<String>,
}

/// Owner of the selection and the highlighted set
#[derive(Clone, Debug, Default)]
pub struct CursorSynchronizer {
    selection: SelectionState,
    highlighted: HighlightSet,
}

impl CursorSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn highlighted(&self) -> &[String] {
        self.highlighted.ids()
    }

    pub fn anchor(&self) -> Option<&str> {
        self.selection.anchor()
    }

    /// Select a clicked element
    pub fn on_graphical_click(
        &mut self,
        id: &str,
        modifiers: Modifiers,
        doc: &Document,
        tree: &RenderedTree,
    ) -> ClickOutcome {
        let selected = self.click_target(id, modifiers, tree);
        if modifiers.multi_select {
            self.selection.push(&selected);
        } else {
            self.selection.replace(&selected);
        }
        let anchor = doc.start_reference(&selected).unwrap_or(selected.as_str()).to_string();
        self.selection.set_anchor(Some(&anchor));

        let cursor_offset = doc.offset_of(&selected);
        if cursor_offset.is_none() {
            log::warn!("CursorSynchronizer: {}", SyncError::ElementNotFound(selected.clone()));
        }
        log::debug!(
            "CursorSynchronizer: click {} -> selection {:?}, anchor {}",
            id,
            self.selection.ids(),
            anchor
        );
        ClickOutcome { selected, cursor_offset }
    }

    /// Tuplet numbers stand for their tuplet; alt-clicks for the chord
    fn click_target(&self, id: &str, modifiers: Modifiers, tree: &RenderedTree) -> String {
        let Some(idx) = tree.index_of(id) else {
            return id.to_string();
        };
        let target = if tree.element(idx).class == "tupletNum" {
            tree.closest(idx, "tuplet")
        } else if modifiers.chord {
            tree.closest(idx, "chord")
        } else {
            None
        };
        target.map_or_else(|| id.to_string(), |t| tree.element(t).id.clone())
    }

    /// Follow a text cursor move; returns the newly selected identifier
    pub fn on_text_cursor_moved(&mut self, offset: usize, origin: Origin, doc: &Document) -> Option<String> {
        if origin == Origin::Synchronizer {
            return None;
        }
        let id = doc.element_at_offset(offset)?;
        self.selection.replace(id);
        match doc.get(id).map(|n| n.kind) {
            Some(NodeKind::Note | NodeKind::Rest | NodeKind::Chord) => self.selection.set_anchor(Some(id)),
            Some(NodeKind::ControlEvent) => {
                if let Some(target) = doc.start_reference(id) {
                    self.selection.set_anchor(Some(target));
                }
            }
            _ => {}
        }
        log::debug!("CursorSynchronizer: cursor at {} selects {}", offset, id);
        Some(id.to_string())
    }

    /// Select one element and make it the anchor (keyboard navigation)
    pub fn select(&mut self, id: &str) {
        self.selection.replace(id);
        self.selection.set_anchor(Some(id));
    }

    /// Recompute the highlight from the selection alone
    ///
    /// With nothing selected the element at `cursor_offset` stands in.
    pub fn update_highlight(&mut self, doc: &Document, tree: &RenderedTree, cursor_offset: usize) -> HighlightUpdate {
        let wanted: Vec<&str> = if self.selection.is_empty() {
            doc.element_at_offset(cursor_offset).into_iter().collect()
        } else {
            self.selection.ids().iter().map(String::as_str).collect()
        };
        let missing = wanted.iter().find(|id| !tree.contains(id)).map(|id| id.to_string());
        let change = self.highlighted.rebuild(tree, wanted);
        HighlightUpdate { change, missing }
    }

    /// Forget selection, anchor and highlight
    pub fn clear(&mut self) -> HighlightChange {
        self.selection.clear();
        self.highlighted.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEI: &str = r##"<mei xmlns="http://www.music-encoding.org/ns/mei"><music><body><mdiv><score><section>
<measure xml:id="m1"><staff n="1"><layer n="1">
<note xml:id="n1"/>
<chord xml:id="c1"><note xml:id="n2"/><note xml:id="n3"/></chord>
<tuplet xml:id="t1"><note xml:id="n4"/></tuplet>
</layer></staff>
<slur xml:id="s1" startid="#n2" endid="#n3"/>
</measure>
<measure xml:id="m2"><staff n="1"><layer n="1"><note xml:id="n5"/></layer></staff></measure>
</section></score></mdiv></body></music></mei>"##;

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
<g id="m1" class="measure"><g id="st" class="staff" data-n="1"><g id="ly" class="layer" data-n="1">
<g id="n1" class="note"><use x="1" y="1"/></g>
<g id="c1" class="chord"><g id="n2" class="note"><use x="2" y="2"/></g><g id="n3" class="note"><use x="2" y="4"/></g></g>
<g id="t1" class="tuplet"><g id="n4" class="note"><use x="3" y="1"/></g><g id="tn1" class="tupletNum"/></g>
</g></g><g id="s1" class="slur"/></g>
</svg>"#;

    fn fixtures() -> (Document, RenderedTree) {
        (Document::parse(MEI).unwrap(), RenderedTree::from_svg(SVG).unwrap())
    }

    #[test]
    fn test_click_replaces_or_appends() {
        let (doc, tree) = fixtures();
        let mut sync = CursorSynchronizer::new();
        let out = sync.on_graphical_click("n1", Modifiers::default(), &doc, &tree);
        assert_eq!(out.cursor_offset, doc.offset_of("n1"));
        sync.on_graphical_click("n2", Modifiers { multi_select: true, chord: false }, &doc, &tree);
        assert_eq!(sync.selection().ids(), &["n1".to_string(), "n2".to_string()]);
        sync.on_graphical_click("n4", Modifiers::default(), &doc, &tree);
        assert_eq!(sync.selection().ids(), &["n4".to_string()]);
        assert_eq!(sync.anchor(), Some("n4"));
    }

    #[test]
    fn test_click_on_control_event_anchors_to_start() {
        let (doc, tree) = fixtures();
        let mut sync = CursorSynchronizer::new();
        sync.on_graphical_click("s1", Modifiers::default(), &doc, &tree);
        assert_eq!(sync.selection().ids(), &["s1".to_string()]);
        assert_eq!(sync.anchor(), Some("n2"));
    }

    #[test]
    fn test_click_targets() {
        let (doc, tree) = fixtures();
        let mut sync = CursorSynchronizer::new();
        assert_eq!(sync.on_graphical_click("tn1", Modifiers::default(), &doc, &tree).selected, "t1");
        let alt = Modifiers { multi_select: false, chord: true };
        assert_eq!(sync.on_graphical_click("n3", alt, &doc, &tree).selected, "c1");
    }

    #[test]
    fn test_synchronizer_moves_are_ignored() {
        let (doc, _) = fixtures();
        let mut sync = CursorSynchronizer::new();
        let offset = doc.offset_of("n5").unwrap() + 2;
        assert_eq!(sync.on_text_cursor_moved(offset, Origin::Synchronizer, &doc), None);
        assert!(sync.selection().is_empty());
        assert_eq!(sync.on_text_cursor_moved(offset, Origin::User, &doc).as_deref(), Some("n5"));
        assert_eq!(sync.anchor(), Some("n5"));
    }

    #[test]
    fn test_highlight_includes_descendants_and_is_idempotent() {
        let (doc, tree) = fixtures();
        let mut sync = CursorSynchronizer::new();
        sync.on_graphical_click("c1", Modifiers::default(), &doc, &tree);
        let first = sync.update_highlight(&doc, &tree, 0);
        assert_eq!(first.change.added, vec!["c1", "n2", "n3"]);
        assert_eq!(first.missing, None);
        let before = sync.highlighted().to_vec();
        let second = sync.update_highlight(&doc, &tree, 0);
        assert!(second.change.is_empty());
        assert_eq!(sync.highlighted(), before.as_slice());

        sync.on_graphical_click("n1", Modifiers::default(), &doc, &tree);
        let third = sync.update_highlight(&doc, &tree, 0);
        assert_eq!(third.change.added, vec!["n1"]);
        assert_eq!(third.change.removed, vec!["c1", "n2", "n3"]);
    }

    #[test]
    fn test_highlight_reports_off_page_element() {
        let (doc, tree) = fixtures();
        let mut sync = CursorSynchronizer::new();
        let offset = doc.offset_of("n5").unwrap() + 1;
        sync.on_text_cursor_moved(offset, Origin::User, &doc);
        let update = sync.update_highlight(&doc, &tree, offset);
        assert_eq!(update.missing.as_deref(), Some("n5"));
        assert!(update.change.added.is_empty());
    }

    #[test]
    fn test_empty_selection_uses_cursor() {
        let (doc, tree) = fixtures();
        let mut sync = CursorSynchronizer::new();
        let update = sync.update_highlight(&doc, &tree, doc.offset_of("n1").unwrap() + 1);
        assert_eq!(update.change.added, vec!["n1"]);
    }
}
