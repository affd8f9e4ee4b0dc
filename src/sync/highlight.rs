//! Highlighted graphical elements
//!
//! The set is always rebuilt from scratch; only the difference to the
//! previous set is reported, so applying a change twice is harmless.

use crate::models::RenderedTree;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Difference between two highlight sets
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightChange {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl HighlightChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightSet {
    /// Highlight order
    ids: Vec<String>,
    members: HashSet<String>,
}

impl HighlightSet {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Highlight `roots` and all their graphical descendants
    pub fn rebuild<'a>(&mut self, tree: &RenderedTree, roots: impl IntoIterator<Item = &'a str>) -> HighlightChange {
        let mut next: Vec<String> = Vec::new();
        let mut members: HashSet<String> = HashSet::new();
        for root in roots {
            let Some(idx) = tree.index_of(root) else {
                continue;
            };
            let ids = std::iter::once(tree.element(idx)).chain(tree.descendants(idx));
            for el in ids {
                if members.insert(el.id.clone()) {
                    next.push(el.id.clone());
                }
            }
        }
        let change = HighlightChange {
            added: next.iter().filter(|id| !self.members.contains(*id)).cloned().collect(),
            removed: self.ids.iter().filter(|id| !members.contains(*id)).cloned().collect(),
        };
        self.ids = next;
        self.members = members;
        change
    }

    /// Drop everything; the removed ids are returned
    pub fn clear(&mut self) -> HighlightChange {
        self.members.clear();
        HighlightChange {
            added: Vec::new(),
            removed: std::mem::take(&mut self.ids),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure_tree(notes: usize) -> RenderedTree {
        let body: String = (0..notes)
            .map(|i| format!(r#"<g id="n{}" class="note"><use x="{}" y="10"/></g>"#, i, i))
            .collect();
        RenderedTree::from_svg(&format!(r#"<svg><g id="m1" class="measure">{}</g></svg>"#, body)).unwrap()
    }

    #[test]
    fn test_whole_measure_selection() {
        let tree = measure_tree(500);
        let mut set = HighlightSet::default();
        let change = set.rebuild(&tree, ["m1", "n3"]);
        // m1 first, then every note once in document order
        assert_eq!(change.added.len(), 501);
        assert_eq!(change.added[0], "m1");
        assert_eq!(change.added[4], "n3");
        assert!(set.contains("n499"));

        let change = set.rebuild(&tree, ["n7"]);
        assert_eq!(change.added, Vec::<String>::new());
        assert_eq!(change.removed.len(), 500);
        assert_eq!(set.ids(), &["n7".to_string()]);

        assert_eq!(set.clear().removed, vec!["n7"]);
        assert!(!set.contains("n7"));
    }
}
