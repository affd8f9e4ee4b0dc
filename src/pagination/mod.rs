//! Pagination engine
//!
//! Decides page boundaries under a break policy and, in speed mode, cuts the
//! markup down to the current page before it is sent to the rendering engine.
//!
//! ## Modules
//!
//! - `layout`: page assignment and apparatus/choice reading selection
//! - `extract`: page slice serialization

pub mod layout;
mod extract;

pub use layout::{PageLayout, ReadingSelector};

use crate::error::{SyncError, SyncResult};
use crate::models::{BreakPolicy, Document, PageBreakMap, PageState};
use serde::{Deserialize, Serialize};

/// Number of pages `doc` splits into under `policy`
///
/// Breaks before the first measure never open a page; under `Auto` the count
/// is the highest page of `break_map` (1 when the map is missing or empty).
pub fn compute_page_count(
    doc: &Document,
    policy: BreakPolicy,
    break_map: Option<&PageBreakMap>,
    source_id: Option<&str>,
) -> u32 {
    PageLayout::compute(doc, policy, break_map, source_id).page_count
}

/// Markup that renders page `page` on its own
///
/// Returns the whole markup unchanged when the document is not split.
pub fn extract_page(
    doc: &Document,
    page: u32,
    policy: BreakPolicy,
    break_map: Option<&PageBreakMap>,
    source_id: Option<&str>,
) -> SyncResult<String> {
    let layout = PageLayout::compute(doc, policy, break_map, source_id);
    if page == 0 || page > layout.page_count {
        return Err(SyncError::PageOutOfRange {
            page,
            page_count: layout.page_count,
        });
    }
    if policy == BreakPolicy::None || layout.page_count == 1 {
        return Ok(doc.source().to_string());
    }
    Ok(extract::serialize_page(doc, &layout, page))
}

/// Page holding the identified element, resolved from the markup alone
pub fn page_of_element(
    doc: &Document,
    id: &str,
    policy: BreakPolicy,
    break_map: Option<&PageBreakMap>,
    source_id: Option<&str>,
) -> Option<u32> {
    let node_id = doc.node_id(id)?;
    Some(PageLayout::compute(doc, policy, break_map, source_id).page_of(node_id))
}

/// Where a page change should go
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PageTarget {
    Number(u32),
    First,
    Last,
    Forwards,
    Backwards,
}

/// Owner of the current page, page count, policy and page-break map
#[derive(Clone, Debug, Default)]
pub struct Paginator {
    state: PageState,
}

impl Paginator {
    pub fn new(policy: BreakPolicy) -> Self {
        Self {
            state: PageState {
                policy,
                ..Default::default()
            },
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn current(&self) -> u32 {
        self.state.current
    }

    pub fn policy(&self) -> BreakPolicy {
        self.state.policy
    }

    pub fn break_map(&self) -> Option<&PageBreakMap> {
        if self.state.break_map.is_empty() {
            None
        } else {
            Some(&self.state.break_map)
        }
    }

    /// Change the policy; returns true when it differs from the old one
    pub fn set_policy(&mut self, policy: BreakPolicy) -> bool {
        if self.state.policy == policy {
            return false;
        }
        log::info!("Paginator: break policy {:?} -> {:?}", self.state.policy, policy);
        self.state.policy = policy;
        if policy == BreakPolicy::Auto {
            self.state.current = 1;
        }
        true
    }

    pub fn set_break_map(&mut self, map: PageBreakMap) {
        log::debug!("Paginator: page break map with {} pages", map.page_count());
        self.state.break_map = map;
    }

    /// Whether an `auto` policy still waits for its page-break map
    pub fn needs_break_map(&self) -> bool {
        self.state.policy == BreakPolicy::Auto && self.state.break_map.is_empty()
    }

    /// Recount pages after a document, policy or map change
    ///
    /// A current page beyond the new count goes back to page 1.
    pub fn recompute(&mut self, doc: &Document, source_id: Option<&str>) -> u32 {
        let count = compute_page_count(doc, self.state.policy, self.break_map(), source_id);
        self.set_count(count);
        count
    }

    /// Record a page count reported by the rendering engine
    pub fn set_count(&mut self, count: u32) {
        let count = count.max(1);
        self.state.count = Some(count);
        if self.state.current > count {
            let err = SyncError::PageOutOfRange {
                page: self.state.current,
                page_count: count,
            };
            log::info!("Paginator: {}, back to page 1", err);
            self.state.current = 1;
        }
    }

    /// Move to `target`; false when it is out of range or already current
    pub fn change_page(&mut self, target: PageTarget) -> bool {
        let count = self.state.count.unwrap_or(1);
        let current = self.state.current;
        let page = match target {
            PageTarget::Number(n) => Some(n),
            PageTarget::First => Some(1),
            PageTarget::Last => Some(count),
            PageTarget::Forwards => (current < count).then(|| current + 1),
            PageTarget::Backwards => (current > 1).then(|| current - 1),
        };
        match page {
            Some(p) if p >= 1 && p <= count && p != current => {
                log::debug!("Paginator: page {} -> {} of {}", current, p, count);
                self.state.current = p;
                true
            }
            _ => false,
        }
    }

    /// Markup slice for the current page
    pub fn current_slice(&self, doc: &Document, source_id: Option<&str>) -> SyncResult<String> {
        extract_page(doc, self.state.current, self.state.policy, self.break_map(), source_id)
    }

    pub fn page_of(&self, doc: &Document, id: &str, source_id: Option<&str>) -> Option<u32> {
        page_of_element(doc, id, self.state.policy, self.break_map(), source_id)
    }

    /// Forget everything derived from the previous document
    pub fn reset(&mut self) {
        self.state.current = 1;
        self.state.count = None;
        self.state.break_map = PageBreakMap::default();
    }
}
