//! `SyncEngine`: the JavaScript handle on the coordinator
//!
//! Every method returns the list of effects as plain JS objects tagged by an
//! `effect` field; the host carries them out (render requests go to the
//! worker, timers to `setTimeout`, highlights to the SVG).

use super::helpers::{deserialize, now, serialize, sync_error};
use crate::config::SyncConfig;
use crate::engine::{Effect, RenderResponse, SyncCoordinator, TimerKind};
use crate::models::BreakPolicy;
use crate::navigation::{Direction, Granularity};
use crate::pagination::PageTarget;
use crate::sync::{Modifiers, Origin};
use crate::text::{TextBuffer, TextPos};
use crate::{wasm_info, wasm_log, wasm_warn};
use wasm_bindgen::prelude::*;

fn effects(list: Vec<Effect>) -> Result<JsValue, JsValue> {
    serialize(&list, "Serialization error")
}

#[wasm_bindgen]
pub struct SyncEngine {
    inner: SyncCoordinator,
}

#[wasm_bindgen]
impl SyncEngine {
    /// Create an engine from a (possibly partial) configuration object
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<SyncEngine, JsValue> {
        let config: SyncConfig = if config.is_undefined() || config.is_null() {
            SyncConfig::default()
        } else {
            deserialize(config, "Invalid configuration")?
        };
        wasm_info!("SyncEngine created (speed mode {})", config.speed_mode);
        Ok(SyncEngine {
            inner: SyncCoordinator::new(config),
        })
    }

    /// Create an engine from a YAML configuration document
    #[wasm_bindgen(js_name = fromYaml)]
    pub fn from_yaml(yaml: &str) -> Result<SyncEngine, JsValue> {
        let config = SyncConfig::from_yaml(yaml).map_err(|e| sync_error("fromYaml", e))?;
        Ok(SyncEngine {
            inner: SyncCoordinator::new(config),
        })
    }

    /// Register a callback for page and highlight notifications
    pub fn subscribe(&mut self, callback: js_sys::Function) {
        self.inner.subscribe(move |notification| {
            let Ok(value) = serialize(notification, "Notification") else {
                return;
            };
            if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                wasm_warn!("subscriber threw: {:?}", e);
            }
        });
    }

    #[wasm_bindgen(js_name = viewState)]
    pub fn view_state(&self) -> Result<JsValue, JsValue> {
        serialize(&self.inner.view_state(), "Serialization error")
    }

    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.inner.is_busy()
    }

    /// Load a new document
    pub fn load(&mut self, markup: &str) -> Result<JsValue, JsValue> {
        wasm_info!("load: {} bytes", markup.len());
        let list = self.inner.load(markup).map_err(|e| sync_error("load", e))?;
        effects(list)
    }

    /// The editor text changed
    pub fn edit(&mut self, markup: &str) -> Result<JsValue, JsValue> {
        let list = self.inner.edit(markup, now()).map_err(|e| sync_error("edit", e))?;
        effects(list)
    }

    /// A timer from a `startTimer` effect went off
    #[wasm_bindgen(js_name = timerFired)]
    pub fn timer_fired(&mut self, timer: JsValue, token: f64) -> Result<JsValue, JsValue> {
        let timer: TimerKind = deserialize(timer, "Invalid timer kind")?;
        effects(self.inner.timer_fired(timer, token as u64))
    }

    pub fn tick(&mut self) -> Result<JsValue, JsValue> {
        effects(self.inner.tick(now()))
    }

    /// A message from the rendering worker
    #[wasm_bindgen(js_name = handleResponse)]
    pub fn handle_response(&mut self, response: JsValue) -> Result<JsValue, JsValue> {
        let response: RenderResponse = deserialize(response, "Invalid engine response")?;
        effects(self.inner.handle_response(response))
    }

    /// Click on a rendered element; `modifiers` is `{ multiSelect, chord }`
    pub fn click(&mut self, id: &str, modifiers: JsValue) -> Result<JsValue, JsValue> {
        let modifiers: Modifiers = if modifiers.is_undefined() {
            Modifiers::default()
        } else {
            deserialize(modifiers, "Invalid modifiers")?
        };
        wasm_log!("click {} {:?}", id, modifiers);
        effects(self.inner.click(id, modifiers))
    }

    /// The text cursor moved to `line`/`col` (0-based, columns in chars)
    #[wasm_bindgen(js_name = cursorMoved)]
    pub fn cursor_moved(&mut self, line: usize, col: usize, origin: JsValue) -> Result<JsValue, JsValue> {
        let origin: Origin = if origin.is_undefined() {
            Origin::User
        } else {
            deserialize(origin, "Invalid origin")?
        };
        let offset = TextPos::new(line, col).to_offset(self.inner.buffer().value());
        effects(self.inner.cursor_moved(offset, origin))
    }

    /// Keyboard navigation, e.g. `("forward", "note")`
    pub fn navigate(&mut self, direction: JsValue, granularity: JsValue) -> Result<JsValue, JsValue> {
        let direction: Direction = deserialize(direction, "Invalid direction")?;
        let granularity: Granularity = deserialize(granularity, "Invalid granularity")?;
        effects(self.inner.navigate(direction, granularity))
    }

    /// `target` is `"first"`, `"last"`, `"forwards"`, `"backwards"` or `{ number: n }`
    #[wasm_bindgen(js_name = changePage)]
    pub fn change_page(&mut self, target: JsValue) -> Result<JsValue, JsValue> {
        let target: PageTarget = deserialize(target, "Invalid page target")?;
        effects(self.inner.change_page(target))
    }

    #[wasm_bindgen(js_name = setBreakPolicy)]
    pub fn set_break_policy(&mut self, policy: JsValue) -> Result<JsValue, JsValue> {
        let policy: BreakPolicy = deserialize(policy, "Invalid break policy")?;
        effects(self.inner.set_break_policy(policy))
    }

    #[wasm_bindgen(js_name = setSpeedMode)]
    pub fn set_speed_mode(&mut self, on: bool) -> Result<JsValue, JsValue> {
        effects(self.inner.set_speed_mode(on))
    }

    /// The player was moved to `time` ms by the user
    pub fn seek(&mut self, time: f64) -> Result<JsValue, JsValue> {
        effects(self.inner.seek(time))
    }

    /// Onset report from the player
    #[wasm_bindgen(js_name = timeAdvance)]
    pub fn time_advance(&mut self, time: f64) -> Result<JsValue, JsValue> {
        effects(self.inner.time_advance(time))
    }

    /// Timer from a `scheduleTask` effect went off
    #[wasm_bindgen(js_name = fireTask)]
    pub fn fire_task(&mut self, task_id: f64) -> Result<JsValue, JsValue> {
        effects(self.inner.fire_task(task_id as u64))
    }

    #[wasm_bindgen(js_name = stopPlayback)]
    pub fn stop_playback(&mut self) -> Result<JsValue, JsValue> {
        effects(self.inner.stop_playback())
    }

    #[wasm_bindgen(js_name = requestPlaybackOnLoad)]
    pub fn request_playback_on_load(&mut self) {
        self.inner.request_playback_on_load();
    }

    #[wasm_bindgen(js_name = seekToSelectionOrPage)]
    pub fn seek_to_selection_or_page(&mut self) -> Result<JsValue, JsValue> {
        effects(self.inner.seek_to_selection_or_page())
    }

    #[wasm_bindgen(js_name = setHighlightPlaying)]
    pub fn set_highlight_playing(&mut self, on: bool) -> Result<JsValue, JsValue> {
        effects(self.inner.set_highlight_playing(on))
    }

    #[wasm_bindgen(js_name = setPageFollow)]
    pub fn set_page_follow(&mut self, on: bool) {
        self.inner.set_page_follow(on);
    }

    #[wasm_bindgen(js_name = setScrollFollow)]
    pub fn set_scroll_follow(&mut self, on: bool) {
        self.inner.set_scroll_follow(on);
    }

    /// Reset selection, anchor, page and page-break map
    pub fn clear(&mut self) -> Result<JsValue, JsValue> {
        effects(self.inner.clear())
    }
}
