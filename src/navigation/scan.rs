//! Lookups inside one measure of the rendered tree

use crate::models::RenderedTree;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    First,
    Last,
}

/// Navigable elements of `staff`/`layer` inside `measure`, in document order
///
/// Falls back to the whole staff when the measure has no such layer, and
/// yields nothing when it has no such staff.
fn candidates(tree: &RenderedTree, measure: usize, staff: u32, layer: u32) -> Vec<usize> {
    let groups = |class: &str, within: usize, n: u32| {
        (within + 1..tree.element(within).end)
            .find(|&i| tree.element(i).class == class && tree.element(i).n == Some(n))
    };
    let Some(staff_idx) = groups("staff", measure, staff) else {
        return Vec::new();
    };
    let scope = groups("layer", staff_idx, layer).unwrap_or(staff_idx);
    (scope + 1..tree.element(scope).end)
        .filter(|&i| tree.element(i).is_navigable())
        .collect()
}

pub fn first_in_measure(tree: &RenderedTree, measure: usize, staff: u32, layer: u32) -> Option<usize> {
    candidates(tree, measure, staff, layer).first().copied()
}

pub fn last_in_measure(tree: &RenderedTree, measure: usize, staff: u32, layer: u32) -> Option<usize> {
    candidates(tree, measure, staff, layer).last().copied()
}

pub fn edge_in_measure(tree: &RenderedTree, measure: usize, staff: u32, layer: u32, edge: Edge) -> Option<usize> {
    match edge {
        Edge::First => first_in_measure(tree, measure, staff, layer),
        Edge::Last => last_in_measure(tree, measure, staff, layer),
    }
}

/// Edge element of `measure` regardless of staff and layer
pub fn any_edge_in_measure(tree: &RenderedTree, measure: usize, edge: Edge) -> Option<usize> {
    let navigable = tree.navigable_in(measure);
    match edge {
        Edge::First => navigable.first().copied(),
        Edge::Last => navigable.last().copied(),
    }
}

/// First hit in `measures` for the staff/layer, then for any element
pub fn scan_measures(
    tree: &RenderedTree,
    measures: &[usize],
    staff: u32,
    layer: u32,
    edge: Edge,
) -> Option<usize> {
    measures
        .iter()
        .find_map(|&m| edge_in_measure(tree, m, staff, layer, edge))
        .or_else(|| measures.iter().find_map(|&m| any_edge_in_measure(tree, m, edge)))
}

/// Chord note nearest in y when `idx` lies in a chord; ties go to the later note
pub fn nearest_in_chord(tree: &RenderedTree, idx: usize, y: Option<f64>) -> usize {
    let (Some(chord), Some(y)) = (tree.element(idx).chord, y) else {
        return idx;
    };
    let mut best = idx;
    let mut diff = f64::MAX;
    for i in chord + 1..tree.element(chord).end {
        let el = tree.element(i);
        if el.class != "note" {
            continue;
        }
        if let Some(anchor) = el.anchor {
            let d = (anchor.y - y).abs();
            if d <= diff {
                diff = d;
                best = i;
            }
        }
    }
    best
}
