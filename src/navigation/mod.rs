//! Spatial navigation over the rendered page
//!
//! Steps from one graphical element to the next in a staff/layer, jumps by
//! measure, or moves up/down between layers by position. When the page runs
//! out of candidates the caller gets a `PageTurnRequest` to resolve once the
//! adjacent page is rendered.
//!
//! Navigation is a pure function of its inputs and the rendered tree: no
//! state is kept between calls.

mod scan;

pub use scan::Edge;

use crate::error::{SyncError, SyncResult};
use crate::models::RenderedTree;
use scan::{first_in_measure, last_in_measure, nearest_in_chord, scan_measures};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
    Up,
    Down,
}

impl Direction {
    fn is_backward(self) -> bool {
        self == Direction::Backward
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Note,
    Measure,
    Layer,
}

/// Continue navigation on the adjacent page
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageTurnRequest {
    pub direction: Direction,
    /// Which element of the target measure to land on
    pub edge: Edge,
    pub staff: u32,
    pub layer: u32,
    /// Source anchor y, for picking a chord note on the new page
    pub y: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NavigationOutcome {
    Element { id: String },
    PageTurn(PageTurnRequest),
    /// Nowhere to go; a no-op for the caller
    Exhausted,
}

impl NavigationOutcome {
    fn element(tree: &RenderedTree, idx: usize) -> Self {
        NavigationOutcome::Element {
            id: tree.element(idx).id.clone(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            NavigationOutcome::Element { id } => Some(id),
            _ => None,
        }
    }
}

/// Next element from `from_id` in `direction`
///
/// `page_turn_pending` turns an exhausted cross-measure scan into
/// `Exhausted` instead of another page turn.
pub fn navigate(
    tree: &RenderedTree,
    from_id: &str,
    direction: Direction,
    granularity: Granularity,
    page_turn_pending: bool,
) -> SyncResult<NavigationOutcome> {
    let source = tree
        .index_of(from_id)
        .ok_or_else(|| SyncError::ElementNotFound(from_id.to_string()))?;

    let Some(measure) = tree.closest(source, "measure") else {
        log::debug!("navigate: {} outside any measure, going to page start", from_id);
        return Ok(tree
            .measures()
            .first()
            .and_then(|&m| tree.navigable_in(m).first().copied())
            .map_or(NavigationOutcome::Exhausted, |idx| NavigationOutcome::element(tree, idx)));
    };

    let outcome = match (direction, granularity) {
        (Direction::Up | Direction::Down, _) | (_, Granularity::Layer) => {
            across_layers(tree, source, measure, direction)
        }
        _ => along_layer(tree, source, measure, direction, granularity, page_turn_pending),
    };
    match &outcome {
        NavigationOutcome::Element { id } => log::debug!("navigate: {} -> {}", from_id, id),
        other => log::debug!("navigate: {} -> {:?}", from_id, other),
    }
    Ok(outcome)
}

/// Forward/backward by note or measure within the source's staff and layer
fn along_layer(
    tree: &RenderedTree,
    source: usize,
    measure: usize,
    direction: Direction,
    granularity: Granularity,
    page_turn_pending: bool,
) -> NavigationOutcome {
    let y = tree.element(source).anchor.map(|a| a.y);
    let Some(staff_n) = tree.element(source).staff.map(|s| tree.element(s).n.unwrap_or(1)) else {
        // no enclosing staff: staff 1 / layer 1 of this measure
        let found = if direction.is_backward() {
            first_in_measure(tree, measure, 1, 1)
        } else {
            last_in_measure(tree, measure, 1, 1)
        };
        return match found {
            Some(idx) => NavigationOutcome::element(tree, idx),
            None => beyond_measure(tree, measure, direction, Edge::First, 1, 1, y, page_turn_pending),
        };
    };
    let layer_n = tree.layer_n(source).unwrap_or(1);
    let chord = unit_chord(tree, source);
    let edge = if direction.is_backward() && granularity == Granularity::Note {
        Edge::Last
    } else {
        Edge::First
    };

    if granularity == Granularity::Measure {
        if direction.is_backward() {
            if let Some(first) = first_in_measure(tree, measure, staff_n, layer_n) {
                let first_unit = tree.element(first).chord.unwrap_or(first);
                let current_unit = chord.unwrap_or(source);
                if first_unit != current_unit {
                    return NavigationOutcome::element(tree, nearest_in_chord(tree, first, y));
                }
            }
        }
        return beyond_measure(tree, measure, direction, edge, staff_n, layer_n, y, page_turn_pending);
    }

    let mut elements = tree.navigable_in(measure);
    if direction.is_backward() {
        elements.reverse();
    }
    let mut found = false;
    for &i in &elements {
        let el = tree.element(i);
        if found && tree.staff_n(i) == Some(staff_n) && el.layer.is_some() && tree.layer_n(i) == Some(layer_n) {
            // notes of the source chord are one unit
            if chord.is_some() && el.chord == chord {
                continue;
            }
            return NavigationOutcome::element(tree, nearest_in_chord(tree, i, y));
        }
        if i == source || (chord == Some(source) && el.chord == Some(source)) {
            found = true;
        }
    }
    beyond_measure(tree, measure, direction, edge, staff_n, layer_n, y, page_turn_pending)
}

/// Chord a source belongs to, or the source itself when it is a chord
fn unit_chord(tree: &RenderedTree, idx: usize) -> Option<usize> {
    let el = tree.element(idx);
    if el.class == "chord" {
        Some(idx)
    } else {
        el.chord
    }
}

#[allow(clippy::too_many_arguments)]
fn beyond_measure(
    tree: &RenderedTree,
    measure: usize,
    direction: Direction,
    edge: Edge,
    staff: u32,
    layer: u32,
    y: Option<f64>,
    page_turn_pending: bool,
) -> NavigationOutcome {
    let measures = tree.measures();
    let Some(pos) = measures.iter().position(|&m| m == measure) else {
        return NavigationOutcome::Exhausted;
    };
    let remaining: Vec<usize> = if direction.is_backward() {
        measures[..pos].iter().rev().copied().collect()
    } else {
        measures[pos + 1..].to_vec()
    };
    if let Some(idx) = scan_measures(tree, &remaining, staff, layer, edge) {
        return NavigationOutcome::element(tree, nearest_in_chord(tree, idx, y));
    }
    if page_turn_pending {
        let err = SyncError::NavigationExhausted(tree.element(measure).id.clone());
        log::debug!("navigate: {}", err);
        return NavigationOutcome::Exhausted;
    }
    NavigationOutcome::PageTurn(PageTurnRequest {
        direction,
        edge,
        staff,
        layer,
        y,
    })
}

/// Up/down to the nearest element above or below, closest in x first
fn across_layers(tree: &RenderedTree, source: usize, measure: usize, direction: Direction) -> NavigationOutcome {
    let Some(origin) = tree.element(source).anchor else {
        return NavigationOutcome::Exhausted;
    };
    let upwards = direction != Direction::Down;
    let mut elements: Vec<(usize, f64, f64)> = tree
        .navigable_in(measure)
        .into_iter()
        .filter_map(|i| tree.element(i).anchor.map(|a| (i, (a.x - origin.x).abs(), a.y)))
        .collect();
    // among equal distances the walk must meet the nearest y on the requested
    // side first, so the order runs away from that side
    elements.sort_by(|a, b| {
        a.1.total_cmp(&b.1).then_with(|| if upwards { b.2.total_cmp(&a.2) } else { a.2.total_cmp(&b.2) })
    });
    let start = elements.iter().position(|&(i, _, _)| i == source).map_or(0, |p| p + 1);
    elements[start..]
        .iter()
        .find(|&&(_, _, y)| if upwards { y < origin.y } else { y > origin.y })
        .map_or(NavigationOutcome::Exhausted, |&(i, _, _)| NavigationOutcome::element(tree, i))
}

/// Land a page turn on the newly rendered page
pub fn resolve_page_turn(tree: &RenderedTree, request: &PageTurnRequest) -> NavigationOutcome {
    let mut measures = tree.measures();
    if request.direction.is_backward() {
        measures.reverse();
    }
    match scan_measures(tree, &measures, request.staff, request.layer, request.edge) {
        Some(idx) => NavigationOutcome::element(tree, nearest_in_chord(tree, idx, request.y)),
        None => NavigationOutcome::Exhausted,
    }
}

/// First element of the page in the given staff/layer, else the first note
pub fn page_beginning(tree: &RenderedTree, staff_layer: Option<(u32, u32)>) -> Option<String> {
    let in_layer = staff_layer.and_then(|(staff, layer)| {
        let first = *tree.measures().first()?;
        first_in_measure(tree, first, staff, layer)
    });
    in_layer
        .map(|idx| tree.element(idx).id.clone())
        .or_else(|| tree.first_note().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, x: u32, y: u32) -> String {
        format!(r#"<g id="{}" class="note"><g class="notehead"><use x="{}" y="{}"/></g></g>"#, id, x, y)
    }

    fn layer(n: u32, body: &str) -> String {
        format!(r#"<g id="l{}-{}" class="layer" data-n="{}">{}</g>"#, n, body.len(), n, body)
    }

    fn page() -> RenderedTree {
        let m1 = format!(
            r#"<g id="m1" class="measure"><g id="s1-1" class="staff" data-n="1">{}{}</g><g id="s1-2" class="staff" data-n="2">{}</g></g>"#,
            layer(
                1,
                &format!(
                    r#"{}<g id="c1" class="chord">{}{}{}</g>{}"#,
                    note("a", 10, 50),
                    note("c1a", 20, 40),
                    note("c1b", 20, 50),
                    note("c1c", 20, 60),
                    note("b", 30, 50)
                )
            ),
            layer(2, &note("v2", 20, 70)),
            layer(1, &note("bass", 20, 120)),
        );
        let m2 = format!(
            r#"<g id="m2" class="measure"><g id="s2-1" class="staff" data-n="1">{}</g></g>"#,
            layer(1, &format!("{}{}", note("d", 50, 50), note("e", 60, 45)))
        );
        RenderedTree::from_svg(&format!(r#"<svg xmlns="http://www.w3.org/2000/svg">{}{}</svg>"#, m1, m2)).unwrap()
    }

    fn id(outcome: SyncResult<NavigationOutcome>) -> String {
        outcome.unwrap().id().unwrap_or("-").to_string()
    }

    #[test]
    fn test_step_over_chord() {
        let tree = page();
        assert_eq!(id(navigate(&tree, "a", Direction::Forward, Granularity::Note, false)), "c1b");
        for n in ["c1a", "c1b", "c1c"] {
            assert_eq!(id(navigate(&tree, n, Direction::Forward, Granularity::Note, false)), "b");
            assert_eq!(id(navigate(&tree, n, Direction::Backward, Granularity::Note, false)), "a");
        }
    }

    #[test]
    fn test_stays_in_layer() {
        let tree = page();
        // v2 is the only element of layer 2: next is measure 2, which has no layer 2
        // so the staff fallback gives its first element
        assert_eq!(id(navigate(&tree, "v2", Direction::Forward, Granularity::Note, false)), "d");
        assert_eq!(id(navigate(&tree, "b", Direction::Forward, Granularity::Note, false)), "d");
    }

    #[test]
    fn test_page_turn_at_page_end() {
        let tree = page();
        let outcome = navigate(&tree, "e", Direction::Forward, Granularity::Note, false).unwrap();
        assert_eq!(
            outcome,
            NavigationOutcome::PageTurn(PageTurnRequest {
                direction: Direction::Forward,
                edge: Edge::First,
                staff: 1,
                layer: 1,
                y: Some(45.0),
            })
        );
        let outcome = navigate(&tree, "e", Direction::Forward, Granularity::Note, true).unwrap();
        assert_eq!(outcome, NavigationOutcome::Exhausted);
    }

    #[test]
    fn test_backward_page_turn_wants_last() {
        let tree = page();
        match navigate(&tree, "a", Direction::Backward, Granularity::Note, false).unwrap() {
            NavigationOutcome::PageTurn(req) => assert_eq!(req.edge, Edge::Last),
            other => panic!("expected page turn, got {:?}", other),
        }
    }

    #[test]
    fn test_measure_steps() {
        let tree = page();
        assert_eq!(id(navigate(&tree, "c1a", Direction::Forward, Granularity::Measure, false)), "d");
        assert_eq!(id(navigate(&tree, "e", Direction::Backward, Granularity::Measure, false)), "d");
        // already at the start of measure 2: previous measure's first element
        assert_eq!(id(navigate(&tree, "d", Direction::Backward, Granularity::Measure, false)), "a");
    }

    #[test]
    fn test_up_and_down() {
        let tree = page();
        assert_eq!(id(navigate(&tree, "c1b", Direction::Up, Granularity::Layer, false)), "c1a");
        assert_eq!(id(navigate(&tree, "c1b", Direction::Down, Granularity::Layer, false)), "c1c");
        assert_eq!(id(navigate(&tree, "c1c", Direction::Down, Granularity::Layer, false)), "v2");
        assert_eq!(id(navigate(&tree, "v2", Direction::Down, Granularity::Layer, false)), "bass");
        assert_eq!(
            navigate(&tree, "bass", Direction::Down, Granularity::Layer, false).unwrap(),
            NavigationOutcome::Exhausted
        );
    }

    #[test]
    fn test_unknown_source() {
        let tree = page();
        assert_eq!(
            navigate(&tree, "zz", Direction::Forward, Granularity::Note, false).unwrap_err(),
            SyncError::ElementNotFound("zz".into())
        );
    }

    #[test]
    fn test_resolve_page_turn_and_page_beginning() {
        let tree = page();
        let back = PageTurnRequest {
            direction: Direction::Backward,
            edge: Edge::Last,
            staff: 1,
            layer: 1,
            y: Some(50.0),
        };
        assert_eq!(resolve_page_turn(&tree, &back).id(), Some("e"));
        let fwd = PageTurnRequest {
            direction: Direction::Forward,
            edge: Edge::First,
            staff: 2,
            layer: 1,
            y: None,
        };
        assert_eq!(resolve_page_turn(&tree, &fwd).id(), Some("bass"));
        assert_eq!(page_beginning(&tree, Some((2, 1))).as_deref(), Some("bass"));
        assert_eq!(page_beginning(&tree, None).as_deref(), Some("a"));
    }
}
