//! Page assignment for every node of a document
//!
//! One pass in document order decides which page each node belongs to under a
//! break policy. Counting, extraction and element lookup all read the same
//! layout, so they cannot disagree about where a page starts.

use crate::models::{BreakPolicy, Document, NodeId, NodeKind, PageBreakMap};
use std::collections::HashMap;

/// Selected branch of every apparatus/choice group in a document
pub struct ReadingSelector {
    selected: HashMap<NodeId, NodeId>,
}

impl ReadingSelector {
    /// `source_id` picks the reading whose `@source` names it; otherwise the
    /// accepted reading (`lem`), otherwise the first `rdg`. Choice groups keep
    /// their first child.
    pub fn new(doc: &Document, source_id: Option<&str>) -> Self {
        let mut selected = HashMap::new();
        for (node_id, node) in doc.nodes() {
            let children = move || node.children.iter().copied().filter(move |&c| doc.node(c).is_element());
            let branch = match node.kind {
                NodeKind::ApparatusGroup => {
                    let readings: Vec<NodeId> =
                        children().filter(|&c| doc.node(c).kind == NodeKind::Reading).collect();
                    let by_source = source_id.and_then(|source| {
                        readings.iter().copied().find(|&r| {
                            doc.node(r).attribute("source").map_or(false, |s| {
                                s.split_whitespace().any(|t| t.trim_start_matches('#') == source)
                            })
                        })
                    });
                    by_source
                        .or_else(|| readings.iter().copied().find(|&r| doc.node(r).name == "lem"))
                        .or_else(|| readings.iter().copied().find(|&r| doc.node(r).name == "rdg"))
                }
                NodeKind::ChoiceGroup => children().next(),
                _ => None,
            };
            match branch {
                Some(b) => {
                    selected.insert(node_id, b);
                }
                None if matches!(node.kind, NodeKind::ApparatusGroup | NodeKind::ChoiceGroup) => {
                    log::warn!("ReadingSelector: group {:?} has no selectable branch", node.id);
                }
                None => {}
            }
        }
        Self { selected }
    }

    /// True when every enclosing group selects the branch holding `node_id`
    pub fn is_selected(&self, doc: &Document, node_id: NodeId) -> bool {
        let mut child = node_id;
        for ancestor in doc.ancestors(node_id) {
            if let Some(&branch) = self.selected.get(&ancestor) {
                if branch != child {
                    return false;
                }
            } else if matches!(doc.node(ancestor).kind, NodeKind::ApparatusGroup | NodeKind::ChoiceGroup) {
                return false;
            }
            child = ancestor;
        }
        true
    }
}

/// Page number of every node plus the resulting page count
#[derive(Clone, Debug, PartialEq)]
pub struct PageLayout {
    pub page_count: u32,
    node_pages: Vec<u32>,
}

impl PageLayout {
    pub fn compute(
        doc: &Document,
        policy: BreakPolicy,
        break_map: Option<&PageBreakMap>,
        source_id: Option<&str>,
    ) -> Self {
        match policy {
            BreakPolicy::None => Self::single_page(doc),
            BreakPolicy::Auto => match break_map {
                Some(map) if !map.is_empty() => Self::from_break_map(doc, map),
                _ => Self::single_page(doc),
            },
            _ => Self::from_markers(doc, policy, source_id),
        }
    }

    fn single_page(doc: &Document) -> Self {
        Self {
            page_count: 1,
            node_pages: vec![1; doc.len()],
        }
    }

    fn from_markers(doc: &Document, policy: BreakPolicy, source_id: Option<&str>) -> Self {
        let selector = ReadingSelector::new(doc, source_id);
        let measures: Vec<NodeId> = doc.measures().filter(|&m| selector.is_selected(doc, m)).collect();
        let last_measure = measures.last().copied();

        let mut node_pages = Vec::with_capacity(doc.len());
        let mut page = 1;
        let mut seen_measure = false;
        let mut broke_since_measure = false;
        for (node_id, node) in doc.nodes() {
            node_pages.push(page);
            match node.kind {
                NodeKind::Measure if selector.is_selected(doc, node_id) => {
                    seen_measure = true;
                    broke_since_measure = false;
                }
                NodeKind::BreakMarker => {
                    let enabled = node.break_kind().map_or(false, |k| policy.counts(k));
                    // leading breaks never open a page, nor do trailing ones
                    let followed = last_measure.map_or(false, |m| node_id < m);
                    if enabled
                        && seen_measure
                        && followed
                        && !broke_since_measure
                        && selector.is_selected(doc, node_id)
                    {
                        page += 1;
                        broke_since_measure = true;
                    }
                }
                _ => {}
            }
        }
        Self { page_count: page, node_pages }
    }

    fn from_break_map(doc: &Document, map: &PageBreakMap) -> Self {
        let page_count = map.page_count();
        // node index at which each page after a mapped one begins
        let mut starts: Vec<(NodeId, u32)> = map
            .0
            .iter()
            .filter_map(|(&page, id)| {
                let node_id = doc.node_id(id).or_else(|| {
                    log::warn!("PageLayout: page {} ends at unknown element {}", page, id);
                    None
                })?;
                let measure = doc.enclosing(node_id, NodeKind::Measure).unwrap_or(node_id);
                Some((doc.node(measure).end, page + 1))
            })
            .collect();
        starts.sort();

        let mut node_pages = Vec::with_capacity(doc.len());
        let mut page = 1;
        let mut next = starts.iter().peekable();
        for node_id in 0..doc.len() {
            while let Some(&&(start, p)) = next.peek() {
                if start > node_id {
                    break;
                }
                page = p.min(page_count);
                next.next();
            }
            node_pages.push(page);
        }
        Self { page_count, node_pages }
    }

    pub fn page_of(&self, node_id: NodeId) -> u32 {
        self.node_pages.get(node_id).copied().unwrap_or(1)
    }
}
