//! Stateless pagination entry points
//!
//! Used by the rendering worker, which slices pages without holding a
//! `SyncEngine`.

use super::helpers::{deserialize, sync_error};
use crate::models::{BreakPolicy, Document, PageBreakMap};
use crate::pagination;
use crate::wasm_log;
use wasm_bindgen::prelude::*;

fn break_map(value: JsValue) -> Result<Option<PageBreakMap>, JsValue> {
    if value.is_undefined() || value.is_null() {
        Ok(None)
    } else {
        deserialize(value, "Invalid page break map").map(Some)
    }
}

/// Number of pages of `markup` under `policy`
#[wasm_bindgen(js_name = computePageCount)]
pub fn compute_page_count(
    markup: &str,
    policy: JsValue,
    page_break_map: JsValue,
    source_id: Option<String>,
) -> Result<u32, JsValue> {
    let policy: BreakPolicy = deserialize(policy, "Invalid break policy")?;
    let map = break_map(page_break_map)?;
    let doc = Document::parse(markup).map_err(|e| sync_error("computePageCount", e))?;
    let count = pagination::compute_page_count(&doc, policy, map.as_ref(), source_id.as_deref());
    wasm_log!("computePageCount: {:?} -> {}", policy, count);
    Ok(count)
}

/// Markup of page `page` (1-based) on its own
#[wasm_bindgen(js_name = extractPage)]
pub fn extract_page(
    markup: &str,
    page: u32,
    policy: JsValue,
    page_break_map: JsValue,
    source_id: Option<String>,
) -> Result<String, JsValue> {
    let policy: BreakPolicy = deserialize(policy, "Invalid break policy")?;
    let map = break_map(page_break_map)?;
    let doc = Document::parse(markup).map_err(|e| sync_error("extractPage", e))?;
    pagination::extract_page(&doc, page, policy, map.as_ref(), source_id.as_deref())
        .map_err(|e| sync_error("extractPage", e))
}
