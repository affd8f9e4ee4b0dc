//! Markup slice for one page (speed mode)
//!
//! Measures and breaks of the target page are copied verbatim from the
//! source. Context elements (score/staff definitions, header) are kept when
//! they come before the end of the page, so key and meter in force at the
//! page start still reach the renderer. Containers survive only if something
//! inside them survives.

use super::layout::PageLayout;
use crate::models::{Document, NodeId, NodeKind};
use quick_xml::escape::escape;

pub(crate) fn serialize_page(doc: &Document, layout: &PageLayout, page: u32) -> String {
    let mut out = String::with_capacity(doc.source().len() / layout.page_count.max(1) as usize);
    write_node(doc, layout, page, doc.root(), &mut out);
    out
}

/// What to do with a node when writing a page slice
enum Keep {
    Drop,
    /// Copy the node's source text unchanged
    Verbatim,
    /// Write the tags and filter the children
    Filtered,
}

fn decide(doc: &Document, layout: &PageLayout, page: u32, node_id: NodeId) -> Keep {
    let node = doc.node(node_id);
    let node_page = layout.page_of(node_id);
    match node.kind {
        NodeKind::Measure | NodeKind::BreakMarker => {
            if node_page == page {
                Keep::Verbatim
            } else {
                Keep::Drop
            }
        }
        NodeKind::Text => Keep::Verbatim,
        _ if doc.has_descendant_of_kind(node_id, NodeKind::Measure) => {
            if node.children.iter().any(|&c| is_kept(doc, layout, page, c)) {
                Keep::Filtered
            } else {
                Keep::Drop
            }
        }
        _ if node_page <= page => Keep::Verbatim,
        _ => Keep::Drop,
    }
}

fn is_kept(doc: &Document, layout: &PageLayout, page: u32, node_id: NodeId) -> bool {
    doc.node(node_id).is_element() && !matches!(decide(doc, layout, page, node_id), Keep::Drop)
}

fn write_node(doc: &Document, layout: &PageLayout, page: u32, node_id: NodeId, out: &mut String) {
    let node = doc.node(node_id);
    match decide(doc, layout, page, node_id) {
        Keep::Drop => {}
        Keep::Verbatim if node.kind == NodeKind::Text => {
            if let Some(text) = node.text.as_deref().filter(|t| !t.trim().is_empty()) {
                out.push_str(&escape(text));
            }
        }
        Keep::Verbatim => {
            out.push_str(&doc.source()[node.range.clone()]);
            out.push('\n');
        }
        Keep::Filtered => {
            out.push('<');
            out.push_str(&node.name);
            for (prefix, uri) in &node.namespaces {
                match prefix {
                    Some(p) => out.push_str(&format!(" xmlns:{}=\"{}\"", p, escape(uri.as_str()))),
                    None => out.push_str(&format!(" xmlns=\"{}\"", escape(uri.as_str()))),
                }
            }
            for (name, value) in &node.attributes {
                out.push_str(&format!(" {}=\"{}\"", name, escape(value.as_str())));
            }
            out.push_str(">\n");
            for &child in &node.children {
                write_node(doc, layout, page, child, out);
            }
            out.push_str("</");
            out.push_str(&node.name);
            out.push_str(">\n");
        }
    }
}
