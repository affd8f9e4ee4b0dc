//! Graphical tree of one rendered page
//!
//! Built from the SVG the rendering engine returns. Each `<g id class>` group
//! becomes a `RenderedElement`; containment (measure, staff, layer, chord) is
//! resolved once while parsing so navigation never has to walk the SVG again.

use crate::error::{SyncError, SyncResult};
use crate::models::document::NAVIGABLE_RESTS;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Median x/y of an element's glyph anchors
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderedElement {
    pub id: String,
    /// First class token, e.g. `note`, `chord`, `measure`
    pub class: String,
    pub parent: Option<usize>,
    /// One past the last descendant (indices are in document order)
    pub end: usize,
    pub measure: Option<usize>,
    pub staff: Option<usize>,
    pub layer: Option<usize>,
    pub chord: Option<usize>,
    /// `data-n` of a staff or layer group
    pub n: Option<u32>,
    pub anchor: Option<Anchor>,
}

impl RenderedElement {
    pub fn is_navigable(&self) -> bool {
        self.class == "note" || NAVIGABLE_RESTS.contains(&self.class.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RenderedTree {
    elements: Vec<RenderedElement>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

#[derive(Clone, Copy, Default)]
struct Scope {
    parent: Option<usize>,
    measure: Option<usize>,
    staff: Option<usize>,
    layer: Option<usize>,
    chord: Option<usize>,
}

struct PendingAnchors {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl RenderedTree {
    /// Parse the SVG of one rendered page
    pub fn from_svg(svg: &str) -> SyncResult<Self> {
        let xml = roxmltree::Document::parse(svg).map_err(|e| SyncError::Svg(e.to_string()))?;
        let mut tree = RenderedTree::default();
        let mut anchors: Vec<PendingAnchors> = Vec::new();
        tree.collect_groups(xml.root_element(), Scope::default(), &mut anchors);
        tree.resolve_anchors(anchors);
        log::debug!("RenderedTree parsed: {} elements", tree.elements.len());
        Ok(tree)
    }

    fn collect_groups(&mut self, node: roxmltree::Node, scope: Scope, anchors: &mut Vec<PendingAnchors>) {
        for child in node.children().filter(|c| c.is_element()) {
            let mut inner = scope;
            if child.tag_name().name() == "g" {
                if let (Some(id), Some(class)) = (child.attribute("id"), child.attribute("class")) {
                    let class = class.split_whitespace().next().unwrap_or_default().to_string();
                    let idx = self.elements.len();
                    let n = child.attribute("data-n").and_then(|n| n.parse().ok());
                    let is_navigable = class == "note" || NAVIGABLE_RESTS.contains(&class.as_str());
                    let (xs, ys) = if is_navigable { glyph_anchors(child) } else { (Vec::new(), Vec::new()) };
                    self.index.insert(id.to_string(), idx);
                    self.elements.push(RenderedElement {
                        id: id.to_string(),
                        class: class.clone(),
                        parent: scope.parent,
                        end: idx + 1,
                        measure: scope.measure,
                        staff: scope.staff,
                        layer: scope.layer,
                        chord: scope.chord,
                        n,
                        anchor: None,
                    });
                    anchors.push(PendingAnchors { xs, ys });
                    inner.parent = Some(idx);
                    match class.as_str() {
                        "measure" => inner.measure = Some(idx),
                        "staff" => inner.staff = Some(idx),
                        "layer" => inner.layer = Some(idx),
                        "chord" => inner.chord = Some(idx),
                        _ => {}
                    }
                    self.collect_groups(child, inner, anchors);
                    self.elements[idx].end = self.elements.len();
                    continue;
                }
            }
            self.collect_groups(child, inner, anchors);
        }
    }

    fn resolve_anchors(&mut self, pending: Vec<PendingAnchors>) {
        for (idx, p) in pending.iter().enumerate() {
            if let (Some(x), Some(y)) = (median(&p.xs), median(&p.ys)) {
                self.elements[idx].anchor = Some(Anchor { x, y });
            }
        }
        // chords: median over their notes
        for idx in 0..self.elements.len() {
            if self.elements[idx].class != "chord" {
                continue;
            }
            let notes: Vec<Anchor> = self
                .descendants(idx)
                .filter(|e| e.class == "note")
                .filter_map(|e| e.anchor)
                .collect();
            let xs: Vec<f64> = notes.iter().map(|a| a.x).collect();
            let ys: Vec<f64> = notes.iter().map(|a| a.y).collect();
            if let (Some(x), Some(y)) = (median(&xs), median(&ys)) {
                self.elements[idx].anchor = Some(Anchor { x, y });
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn element(&self, idx: usize) -> &RenderedElement {
        &self.elements[idx]
    }

    pub fn get(&self, id: &str) -> Option<&RenderedElement> {
        self.index_of(id).map(|i| &self.elements[i])
    }

    pub fn elements(&self) -> &[RenderedElement] {
        &self.elements
    }

    pub fn descendants(&self, idx: usize) -> impl Iterator<Item = &RenderedElement> {
        self.elements[idx + 1..self.elements[idx].end].iter()
    }

    /// Measure indices in document order
    pub fn measures(&self) -> Vec<usize> {
        (0..self.elements.len())
            .filter(|&i| self.elements[i].class == "measure")
            .collect()
    }

    /// Navigable elements inside a measure, in document order
    pub fn navigable_in(&self, measure: usize) -> Vec<usize> {
        (measure + 1..self.elements[measure].end)
            .filter(|&i| self.elements[i].is_navigable())
            .collect()
    }

    /// Staff number of an element; `None` outside any staff
    pub fn staff_n(&self, idx: usize) -> Option<u32> {
        self.elements[idx].staff.and_then(|s| self.elements[s].n)
    }

    pub fn layer_n(&self, idx: usize) -> Option<u32> {
        self.elements[idx].layer.and_then(|l| self.elements[l].n)
    }

    /// Nearest ancestor-or-self with the given class
    pub fn closest(&self, idx: usize, class: &str) -> Option<usize> {
        std::iter::successors(Some(idx), |&i| self.elements[i].parent)
            .find(|&i| self.elements[i].class == class)
    }

    pub fn first_note(&self) -> Option<&str> {
        self.elements
            .iter()
            .find(|e| e.class == "note")
            .map(|e| e.id.as_str())
    }
}

/// Glyph anchors of a navigable group: notehead glyphs when present, else
/// every positioned glyph below it
fn glyph_anchors(group: roxmltree::Node) -> (Vec<f64>, Vec<f64>) {
    let positioned = |node: roxmltree::Node| node.tag_name().name() == "use" && node.has_attribute("x");
    let mut uses: Vec<roxmltree::Node> = group
        .descendants()
        .filter(|d| d.attribute("class").map_or(false, |c| c.split_whitespace().any(|t| t == "notehead")))
        .flat_map(|head| head.children().filter(|c| positioned(*c)))
        .collect();
    if uses.is_empty() {
        uses = group.descendants().filter(|d| positioned(*d)).collect();
    }
    let coord = |n: &roxmltree::Node, a: &str| n.attribute(a).and_then(|v| v.parse::<f64>().ok());
    let xs = uses.iter().filter_map(|u| coord(u, "x")).collect();
    let ys = uses.iter().filter_map(|u| coord(u, "y")).collect();
    (xs, ys)
}

/// Median of a list; the mean of the middle pair for even lengths
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
