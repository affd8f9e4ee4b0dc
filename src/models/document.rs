//! Document tree parsed from the markup
//!
//! The tree is an arena in document (pre-)order, so a node's descendants are
//! the contiguous id range `id + 1 .. node.end`. Re-parsing builds a new tree;
//! node ids never survive an edit.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;

pub type NodeId = usize;

pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Tags that the navigation engine can land on besides notes
pub const NAVIGABLE_RESTS: &[&str] = &["rest", "mRest", "beatRpt", "halfmRpt", "mRpt", "clef"];

const CONTROL_EVENTS: &[&str] = &[
    "slur", "tie", "dynam", "hairpin", "dir", "tempo", "fermata", "trill", "mordent", "turn",
    "harm", "pedal", "phrase", "arpeg", "breath", "octave", "fing", "gliss", "bend", "lv", "reh",
    "caesura",
];

const CONTEXT_ELEMENTS: &[&str] = &["scoreDef", "staffDef", "keySig", "meterSig", "staffGrp"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Measure,
    Staff,
    Layer,
    Chord,
    Note,
    Rest,
    Tuplet,
    ControlEvent,
    BreakMarker,
    ApparatusGroup,
    Reading,
    ChoiceGroup,
    Context,
    Text,
    Other,
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "measure" => NodeKind::Measure,
            "staff" => NodeKind::Staff,
            "layer" => NodeKind::Layer,
            "chord" => NodeKind::Chord,
            "note" => NodeKind::Note,
            "tuplet" => NodeKind::Tuplet,
            "sb" | "pb" => NodeKind::BreakMarker,
            "app" => NodeKind::ApparatusGroup,
            "lem" | "rdg" => NodeKind::Reading,
            "choice" => NodeKind::ChoiceGroup,
            t if NAVIGABLE_RESTS.contains(&t) => NodeKind::Rest,
            t if CONTROL_EVENTS.contains(&t) => NodeKind::ControlEvent,
            t if CONTEXT_ELEMENTS.contains(&t) => NodeKind::Context,
            _ => NodeKind::Other,
        }
    }

    /// Elements a text cursor or a click can resolve to for navigation
    pub fn is_navigable(self) -> bool {
        matches!(self, NodeKind::Note | NodeKind::Rest)
    }
}

/// Kind of candidate page/system boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    /// `<sb/>`: system (line) break
    System,
    /// `<pb/>`: page break
    Page,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocNode {
    pub kind: NodeKind,
    /// Qualified tag name; empty for text nodes
    pub name: String,
    pub id: Option<String>,
    /// Qualified attribute names and values in source order
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    /// Byte range in the markup
    pub range: Range<usize>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// One past the last descendant
    pub end: NodeId,
    /// Namespace declarations, only recorded on the root element
    pub namespaces: Vec<(Option<String>, String)>,
}

impl DocNode {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn break_kind(&self) -> Option<BreakKind> {
        match self.name.as_str() {
            "sb" => Some(BreakKind::System),
            "pb" => Some(BreakKind::Page),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        self.kind != NodeKind::Text
    }
}

/// Parsed markup with identifier and offset lookups
#[derive(Clone, Debug)]
pub struct Document {
    source: String,
    nodes: Vec<DocNode>,
    ids: HashMap<String, NodeId>,
}

impl Document {
    /// Parse markup into a fresh tree
    pub fn parse(markup: &str) -> SyncResult<Self> {
        let xml = roxmltree::Document::parse(markup)?;
        let mut doc = Document {
            source: markup.to_string(),
            nodes: Vec::new(),
            ids: HashMap::new(),
        };
        doc.push_node(xml.root_element(), None, true)?;
        log::debug!("Document parsed: {} nodes, {} identifiers", doc.nodes.len(), doc.ids.len());
        Ok(doc)
    }

    fn push_node(
        &mut self,
        xml_node: roxmltree::Node,
        parent: Option<NodeId>,
        is_root: bool,
    ) -> SyncResult<Option<NodeId>> {
        let node_id = self.nodes.len();
        let node = if xml_node.is_element() {
            let tag = xml_node.tag_name();
            let name = qualify(xml_node, tag.namespace(), tag.name());
            let attributes: Vec<(String, String)> = xml_node
                .attributes()
                .map(|a| (qualify(xml_node, a.namespace(), a.name()), a.value().to_string()))
                .collect();
            let id = xml_node.attribute((XML_NS, "id")).map(str::to_string);
            if let Some(ref id) = id {
                if self.ids.insert(id.clone(), node_id).is_some() {
                    return Err(SyncError::DuplicateIdentifier(id.clone()));
                }
            }
            let namespaces = if is_root {
                xml_node
                    .namespaces()
                    .filter(|ns| ns.name() != Some("xml"))
                    .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
                    .collect()
            } else {
                Vec::new()
            };
            DocNode {
                kind: NodeKind::from_tag(tag.name()),
                name,
                id,
                attributes,
                text: None,
                range: xml_node.range(),
                parent,
                children: Vec::new(),
                end: node_id + 1,
                namespaces,
            }
        } else if xml_node.is_text() {
            DocNode {
                kind: NodeKind::Text,
                name: String::new(),
                id: None,
                attributes: Vec::new(),
                text: xml_node.text().map(str::to_string),
                range: xml_node.range(),
                parent,
                children: Vec::new(),
                end: node_id + 1,
                namespaces: Vec::new(),
            }
        } else {
            // comments and processing instructions carry nothing we sync on
            return Ok(None);
        };
        self.nodes.push(node);

        for child in xml_node.children() {
            if let Some(child_id) = self.push_node(child, Some(node_id), false)? {
                self.nodes[node_id].children.push(child_id);
            }
        }
        self.nodes[node_id].end = self.nodes.len();
        Ok(Some(node_id))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, node_id: NodeId) -> &DocNode {
        &self.nodes[node_id]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &DocNode)> {
        self.nodes.iter().enumerate()
    }

    pub fn node_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&DocNode> {
        self.node_id(id).map(|n| &self.nodes[n])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[node_id].parent, move |&n| self.nodes[n].parent)
    }

    /// Nearest ancestor-or-self of the given kind
    pub fn enclosing(&self, node_id: NodeId, kind: NodeKind) -> Option<NodeId> {
        std::iter::once(node_id)
            .chain(self.ancestors(node_id))
            .find(|&n| self.nodes[n].kind == kind)
    }

    pub fn is_descendant_of(&self, node_id: NodeId, ancestor: NodeId) -> bool {
        node_id > ancestor && node_id < self.nodes[ancestor].end
    }

    pub fn has_descendant_of_kind(&self, node_id: NodeId, kind: NodeKind) -> bool {
        self.nodes[node_id + 1..self.nodes[node_id].end]
            .iter()
            .any(|n| n.kind == kind)
    }

    /// Measure nodes in document order
    pub fn measures(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == NodeKind::Measure)
            .map(|(i, _)| i)
    }

    /// Markup offset where the identified element starts
    pub fn offset_of(&self, id: &str) -> Option<usize> {
        self.get(id).map(|n| n.range.start)
    }

    pub fn attribute_of(&self, id: &str, attribute: &str) -> Option<&str> {
        self.get(id).and_then(|n| n.attribute(attribute))
    }

    /// Deepest identified element whose range contains `offset`
    pub fn element_at_offset(&self, offset: usize) -> Option<&str> {
        // ranges containing an offset form one ancestor chain, so the last hit
        // in pre-order is the deepest
        self.nodes
            .iter()
            .filter(|n| n.id.is_some() && n.range.start <= offset && offset < n.range.end)
            .last()
            .and_then(|n| n.id.as_deref())
    }

    /// Effective value of `attribute` on the nearest `tag` element at `offset`
    ///
    /// Looks at enclosing elements first, then at the closest such element
    /// that starts before the offset (e.g. the staff number in force for a
    /// control event that sits outside any staff).
    pub fn attribute_above(&self, offset: usize, tag: &str, attribute: &str) -> Option<&str> {
        let enclosing = self
            .nodes
            .iter()
            .filter(|n| n.name == tag && n.range.start <= offset && offset < n.range.end)
            .last()
            .and_then(|n| n.attribute(attribute));
        enclosing.or_else(|| {
            self.nodes
                .iter()
                .filter(|n| n.name == tag && n.range.start <= offset)
                .filter_map(|n| n.attribute(attribute))
                .last()
        })
    }

    /// Target of a control event's start reference, without the leading `#`
    pub fn start_reference(&self, id: &str) -> Option<&str> {
        self.attribute_of(id, "startid")
            .map(|s| s.strip_prefix('#').unwrap_or(s))
            .filter(|s| !s.is_empty())
    }
}

fn qualify(node: roxmltree::Node, namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(XML_NS) => format!("xml:{}", name),
        Some(uri) => match node.lookup_prefix(uri) {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, name),
            _ => name.to_string(),
        },
        None => name.to_string(),
    }
}
