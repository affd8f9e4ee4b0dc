//! Synchronization coordinator
//!
//! `SyncCoordinator` owns the view state and the four components. Every
//! entry point takes one event (edit, click, key, engine response, playback
//! report, timer) and answers with the `Effect`s the host has to carry out.
//! Nothing here blocks or talks to the rendering engine directly.
//!
//! ## Modules
//!
//! - `protocol`: request/response messages for the rendering engine
//! - `tracker`: stale-response rejection
//! - `debounce`: quiet-period timers for edit bursts

pub mod debounce;
pub mod protocol;
pub mod tracker;

pub use debounce::{DebounceTimer, Debouncer};
pub use protocol::{Channel, RenderRequest, RenderResponse, RequestTag};
pub use tracker::{RequestContext, RequestTracker};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::models::{BreakPolicy, Document, ExpansionAliasMap, PageBreakMap, RenderedTree, Timemap, ViewState};
use crate::navigation::{self, Direction, Granularity, NavigationOutcome, PageTurnRequest};
use crate::pagination::{PageTarget, Paginator};
use crate::playback::{PlaybackOptions, PlaybackState, PlaybackSynchronizer, PlaybackUpdate, ScheduledTask};
use crate::sync::{CursorSynchronizer, HighlightChange, Modifiers, Origin};
use crate::text::{SimpleBuffer, TextBuffer, TextPos};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    Render,
    Timemap,
}

/// Something the host has to do
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "effect", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Effect {
    Render { request: RenderRequest },
    MoveTextCursor { offset: usize, pos: TextPos },
    Highlight { change: HighlightChange },
    PlaybackHighlight { change: HighlightChange },
    ScheduleTask { task: ScheduledTask },
    StartTimer { timer: TimerKind, token: u64, delay: f64 },
    ScrollTo { id: String },
    SeekPlayer { time: f64 },
    StartPlayback,
    StopPlayback,
    Busy { busy: bool },
}

/// Broadcast to subscribers (page indicator, playback slider, ...)
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Notification {
    PageChanged { page: u32, page_count: Option<u32> },
    HighlightChanged { playback: bool, change: HighlightChange },
}

type Subscriber = Box<dyn FnMut(&Notification)>;

pub struct SyncCoordinator {
    config: SyncConfig,
    buffer: SimpleBuffer,
    document: Option<Document>,
    markup_version: u64,
    tree: RenderedTree,
    paginator: Paginator,
    cursor_sync: CursorSynchronizer,
    playback: PlaybackSynchronizer,
    tracker: RequestTracker,
    render_debounce: Debouncer,
    timemap_debounce: Debouncer,
    /// Keyboard navigation waiting for the adjacent page
    pending_turn: Option<PageTurnRequest>,
    /// Element whose page is being loaded so it can be highlighted
    pending_locate: Option<String>,
    /// Re-seek the player once the requested page is shown
    seek_after_render: bool,
    subscribers: Vec<Subscriber>,
}

impl SyncCoordinator {
    pub fn new(config: SyncConfig) -> Self {
        log::info!(
            "SyncCoordinator: speed mode {}, break policy {:?}",
            config.speed_mode,
            config.break_policy
        );
        Self {
            buffer: SimpleBuffer::new(),
            document: None,
            markup_version: 0,
            tree: RenderedTree::default(),
            paginator: Paginator::new(config.break_policy),
            cursor_sync: CursorSynchronizer::new(),
            playback: PlaybackSynchronizer::new(PlaybackOptions::from(&config)),
            tracker: RequestTracker::new(),
            render_debounce: Debouncer::new(config.render_debounce_ms),
            timemap_debounce: Debouncer::new(config.timemap_debounce_ms),
            pending_turn: None,
            pending_locate: None,
            seek_after_render: false,
            subscribers: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn rendered(&self) -> &RenderedTree {
        &self.tree
    }

    pub fn buffer(&self) -> &SimpleBuffer {
        &self.buffer
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn cursor_sync(&self) -> &CursorSynchronizer {
        &self.cursor_sync
    }

    pub fn playback(&self) -> &PlaybackSynchronizer {
        &self.playback
    }

    pub fn is_busy(&self) -> bool {
        self.tracker.is_busy()
    }

    /// Snapshot of the state owned by the components
    pub fn view_state(&self) -> ViewState {
        ViewState {
            pages: self.paginator.state().clone(),
            selection: self.cursor_sync.selection().clone(),
            playback: self.playback.cursor(),
            markup_version: self.markup_version,
        }
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&Notification) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    fn notify(&mut self, notification: Notification) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&notification);
        }
    }

    fn notify_page(&mut self) {
        let state = self.paginator.state();
        let notification = Notification::PageChanged {
            page: state.current(),
            page_count: state.count(),
        };
        self.notify(notification);
    }

    fn source_id(&self) -> Option<&str> {
        self.config.source_id.as_deref()
    }

    fn context(&self) -> RequestContext {
        RequestContext {
            markup_version: self.markup_version,
            page: self.paginator.current(),
            policy: self.paginator.policy(),
        }
    }

    fn issue(&mut self, channel: Channel, effects: &mut Vec<Effect>) -> RequestTag {
        let was_busy = self.tracker.is_busy();
        let tag = self.tracker.issue(channel, self.context());
        if !was_busy && self.tracker.is_busy() {
            effects.push(Effect::Busy { busy: true });
        }
        tag
    }

    /// Page slice in speed mode; a current page past the end goes back to 1
    fn page_markup(&mut self) -> Option<String> {
        if !self.config.speed_mode {
            return None;
        }
        let doc = self.document.as_ref()?;
        let source_id = self.config.source_id.as_deref();
        match self.paginator.current_slice(doc, source_id) {
            Ok(slice) => Some(slice),
            Err(err) => {
                log::info!("SyncCoordinator: {}, back to page 1", err);
                self.paginator.recompute(doc, source_id);
                self.paginator.change_page(PageTarget::First);
                self.paginator.current_slice(doc, source_id).ok()
            }
        }
    }

    // ------------------------------------------------------------------
    // Document lifecycle
    // ------------------------------------------------------------------

    /// Load a new document: everything derived from the old one is dropped
    pub fn load(&mut self, markup: &str) -> SyncResult<Vec<Effect>> {
        let doc = Document::parse(markup)?;
        self.buffer.set_value(markup);
        self.buffer.set_cursor_offset(0);
        self.document = Some(doc);
        self.markup_version += 1;
        self.tree = RenderedTree::default();
        self.paginator.reset();
        self.pending_turn = None;
        self.pending_locate = None;
        self.render_debounce.cancel();
        self.timemap_debounce.cancel();

        let mut effects = Vec::new();
        let change = self.cursor_sync.clear();
        self.push_highlight(change, false, &mut effects);
        self.request_layout(&mut effects, true);
        self.request_timemap(&mut effects);
        self.notify_page();
        Ok(effects)
    }

    /// Render (or, under `auto` in speed mode, first paginate) the document
    fn request_layout(&mut self, effects: &mut Vec<Effect>, full: bool) {
        let Some(doc) = self.document.as_ref() else {
            return;
        };
        if self.config.speed_mode && self.paginator.needs_break_map() {
            let markup = doc.source().to_string();
            let tag = self.issue(Channel::Render, effects);
            effects.push(Effect::Render {
                request: RenderRequest::ComputePageBreaks { tag, markup },
            });
            return;
        }
        if self.config.speed_mode {
            let source_id = self.config.source_id.clone();
            self.paginator.recompute(doc, source_id.as_deref());
        }
        let markup = self
            .page_markup()
            .unwrap_or_else(|| self.buffer.value().to_string());
        let speed_mode = self.config.speed_mode;
        let tag = self.issue(Channel::Render, effects);
        let request = if full {
            RenderRequest::UpdateAll { tag, markup, speed_mode }
        } else {
            RenderRequest::UpdateData { tag, markup, speed_mode }
        };
        effects.push(Effect::Render { request });
    }

    fn request_timemap(&mut self, effects: &mut Vec<Effect>) {
        if self.document.is_none() {
            return;
        }
        let markup = self.buffer.value().to_string();
        let tag = self.issue(Channel::Timemap, effects);
        effects.push(Effect::Render {
            request: RenderRequest::ComputeTimemap {
                tag,
                markup,
                expansion: None,
            },
        });
    }

    /// Text changed in the editor
    ///
    /// The re-render and the timemap wait for a quiet period; the markup
    /// version moves immediately, so responses to older requests are void.
    /// Markup that does not parse leaves no document behind: offsets of the
    /// previous text would point into the wrong place of the new one.
    pub fn edit(&mut self, markup: &str, now: f64) -> SyncResult<Vec<Effect>> {
        self.buffer.set_value(markup);
        self.markup_version += 1;
        let doc = match Document::parse(markup) {
            Ok(doc) => doc,
            Err(err) => {
                log::warn!("SyncCoordinator: edit does not parse, document dropped: {}", err);
                self.document = None;
                return Err(err);
            }
        };
        self.document = Some(doc);

        let mut effects = Vec::new();
        if self.config.live_update {
            let timer = self.render_debounce.poke(now);
            effects.push(Effect::StartTimer {
                timer: TimerKind::Render,
                token: timer.token,
                delay: timer.delay,
            });
        }
        let timer = self.timemap_debounce.poke(now);
        effects.push(Effect::StartTimer {
            timer: TimerKind::Timemap,
            token: timer.token,
            delay: timer.delay,
        });
        Ok(effects)
    }

    /// A debounce timer started through `Effect::StartTimer` went off
    pub fn timer_fired(&mut self, timer: TimerKind, token: u64) -> Vec<Effect> {
        let mut effects = Vec::new();
        match timer {
            TimerKind::Render if self.render_debounce.fire(token) => self.request_layout(&mut effects, false),
            TimerKind::Timemap if self.timemap_debounce.fire(token) => self.request_timemap(&mut effects),
            _ => {}
        }
        effects
    }

    /// Logical clock: fire due debounce timers and playback tasks
    pub fn tick(&mut self, now: f64) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.render_debounce.poll(now) {
            self.request_layout(&mut effects, false);
        }
        if self.timemap_debounce.poll(now) {
            self.request_timemap(&mut effects);
        }
        let update = self.playback.advance_clock(now);
        self.push_playback(update, &mut effects);
        effects
    }

    /// Reset selection, anchor, page and page-break map
    ///
    /// Outstanding engine requests are forgotten; their answers are stale.
    pub fn clear(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.tracker.is_busy() {
            effects.push(Effect::Busy { busy: false });
        }
        self.tracker.reset();
        let change = self.cursor_sync.clear();
        self.push_highlight(change, false, &mut effects);
        self.paginator.reset();
        self.pending_turn = None;
        self.pending_locate = None;
        self.notify_page();
        effects
    }

    // ------------------------------------------------------------------
    // Pages
    // ------------------------------------------------------------------

    /// User page navigation; the player follows the new page
    pub fn change_page(&mut self, target: PageTarget) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.paginator.change_page(target) {
            self.seek_after_render = true;
            self.request_page(&mut effects, None);
            self.notify_page();
        }
        effects
    }

    fn request_page(&mut self, effects: &mut Vec<Effect>, turn: Option<PageTurnRequest>) {
        let markup = self.page_markup();
        let tag = self.issue(Channel::Render, effects);
        let request = match turn {
            Some(turn) => RenderRequest::NavigatePage { tag, markup, turn },
            None => RenderRequest::UpdatePage { tag, markup },
        };
        effects.push(Effect::Render { request });
    }

    pub fn set_break_policy(&mut self, policy: BreakPolicy) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.paginator.set_policy(policy) {
            self.config.break_policy = policy;
            self.request_layout(&mut effects, true);
            self.notify_page();
        }
        effects
    }

    pub fn set_speed_mode(&mut self, on: bool) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.config.speed_mode != on {
            self.config.speed_mode = on;
            self.request_layout(&mut effects, true);
        }
        effects
    }

    /// Bring the page holding `id` into view
    fn locate(&mut self, id: &str, seek_after: bool, effects: &mut Vec<Effect>) {
        if self.pending_locate.as_deref() == Some(id) {
            log::debug!("SyncCoordinator: {} already being located", id);
            return;
        }
        if self.config.paginates() {
            let page = self
                .document
                .as_ref()
                .and_then(|doc| self.paginator.page_of(doc, id, self.source_id()));
            match page {
                Some(page) if self.paginator.change_page(PageTarget::Number(page)) => {
                    self.pending_locate = Some(id.to_string());
                    self.seek_after_render = seek_after;
                    self.request_page(effects, None);
                    self.notify_page();
                }
                Some(_) => log::debug!("SyncCoordinator: {} belongs to the current page", id),
                None => log::warn!("SyncCoordinator: {}", SyncError::ElementNotFound(id.to_string())),
            }
        } else {
            self.pending_locate = Some(id.to_string());
            self.seek_after_render = seek_after;
            let tag = self.issue(Channel::ElementPage, effects);
            effects.push(Effect::Render {
                request: RenderRequest::QueryElementPage { tag, id: id.to_string() },
            });
        }
    }

    // ------------------------------------------------------------------
    // Engine responses
    // ------------------------------------------------------------------

    pub fn handle_response(&mut self, response: RenderResponse) -> Vec<Effect> {
        let mut effects = Vec::new();
        let was_busy = self.tracker.is_busy();
        let accepted = self.tracker.accept(response.channel(), &response.tag(), self.context());
        if was_busy && !self.tracker.is_busy() {
            effects.push(Effect::Busy { busy: false });
        }
        if let Err(err) = accepted {
            log::debug!("SyncCoordinator: discarding {}", err);
            return effects;
        }

        match response {
            RenderResponse::Rendered { svg, page_count, .. } => self.apply_render(&svg, page_count, &mut effects),
            RenderResponse::PageBreaks { page_break_map, .. } => self.apply_page_breaks(page_break_map, &mut effects),
            RenderResponse::ElementPage { id, page, .. } => match page {
                Some(page) if self.paginator.change_page(PageTarget::Number(page)) => {
                    self.request_page(&mut effects, None);
                    self.notify_page();
                }
                Some(_) => {
                    self.pending_locate = None;
                }
                None => {
                    log::warn!("SyncCoordinator: {}", SyncError::ElementNotFound(id));
                    self.pending_locate = None;
                }
            },
            RenderResponse::Timemap { timemap, aliases, .. } => self.apply_timemap(timemap, aliases, &mut effects),
            RenderResponse::Error { channel, message, .. } => {
                log::warn!("SyncCoordinator: rendering engine failed on {}: {}", channel.name(), message);
                self.pending_turn = None;
                self.pending_locate = None;
            }
        }
        effects
    }

    fn apply_page_breaks(&mut self, map: PageBreakMap, effects: &mut Vec<Effect>) {
        self.paginator.set_break_map(map);
        if let Some(doc) = self.document.as_ref() {
            let source_id = self.config.source_id.clone();
            self.paginator.recompute(doc, source_id.as_deref());
        }
        self.request_page(effects, None);
        self.notify_page();
    }

    fn apply_render(&mut self, svg: &str, page_count: Option<u32>, effects: &mut Vec<Effect>) {
        match RenderedTree::from_svg(svg) {
            Ok(tree) => self.tree = tree,
            Err(err) => {
                log::warn!("SyncCoordinator: {}", err);
                return;
            }
        }
        if !self.config.speed_mode {
            if let Some(count) = page_count {
                self.paginator.set_count(count);
            }
        }

        if let Some(turn) = self.pending_turn.take() {
            match navigation::resolve_page_turn(&self.tree, &turn) {
                NavigationOutcome::Element { id } => self.select_and_show(&id, effects),
                other => log::debug!("SyncCoordinator: page turn landed nowhere ({:?})", other),
            }
        }

        let located = self.pending_locate.take();
        self.refresh_highlight(effects, located.is_none());
        self.notify_page();

        if std::mem::take(&mut self.seek_after_render) && self.playback.state() != PlaybackState::Idle {
            self.seek_to_selection_or_page_into(effects);
        }
    }

    fn apply_timemap(&mut self, timemap: Timemap, aliases: Option<ExpansionAliasMap>, effects: &mut Vec<Effect>) {
        let change = self.playback.set_timemap(timemap, aliases);
        self.push_highlight(change, true, effects);
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    fn push_highlight(&mut self, change: HighlightChange, playback: bool, effects: &mut Vec<Effect>) {
        if change.is_empty() {
            return;
        }
        if playback {
            effects.push(Effect::PlaybackHighlight { change: change.clone() });
        } else {
            effects.push(Effect::Highlight { change: change.clone() });
        }
        self.notify(Notification::HighlightChanged { playback, change });
    }

    /// Recompute the selection highlight; an off-page element may flip pages
    fn refresh_highlight(&mut self, effects: &mut Vec<Effect>, may_locate: bool) {
        let Some(doc) = self.document.as_ref() else {
            return;
        };
        let update = self
            .cursor_sync
            .update_highlight(doc, &self.tree, self.buffer.cursor_offset());
        self.push_highlight(update.change, false, effects);
        if let Some(missing) = update.missing {
            if may_locate && self.config.flip_to_cursor {
                self.locate(&missing, false, effects);
            } else {
                log::debug!("SyncCoordinator: {}", SyncError::ElementNotFound(missing));
            }
        }
    }

    fn move_cursor_to(&mut self, id: &str, effects: &mut Vec<Effect>) {
        if let Some(offset) = self.document.as_ref().and_then(|doc| doc.offset_of(id)) {
            self.buffer.set_cursor_offset(offset);
            let pos = self.buffer.cursor_pos();
            effects.push(Effect::MoveTextCursor { offset, pos });
        }
    }

    fn select_and_show(&mut self, id: &str, effects: &mut Vec<Effect>) {
        self.cursor_sync.select(id);
        self.move_cursor_to(id, effects);
        effects.push(Effect::ScrollTo { id: id.to_string() });
    }

    /// Click on the rendering
    pub fn click(&mut self, id: &str, modifiers: Modifiers) -> Vec<Effect> {
        let mut effects = Vec::new();
        let Some(doc) = self.document.as_ref() else {
            return effects;
        };
        let outcome = self.cursor_sync.on_graphical_click(id, modifiers, doc, &self.tree);
        if let Some(offset) = outcome.cursor_offset {
            self.buffer.set_cursor_offset(offset);
            let pos = self.buffer.cursor_pos();
            effects.push(Effect::MoveTextCursor { offset, pos });
        }
        self.refresh_highlight(&mut effects, true);
        effects
    }

    /// The text cursor moved
    ///
    /// Moves echoed back from `Effect::MoveTextCursor` come tagged
    /// `Origin::Synchronizer` and change nothing.
    pub fn cursor_moved(&mut self, offset: usize, origin: Origin) -> Vec<Effect> {
        let mut effects = Vec::new();
        if origin == Origin::Synchronizer {
            return effects;
        }
        self.buffer.set_cursor_offset(offset);
        let Some(doc) = self.document.as_ref() else {
            return effects;
        };
        if self.cursor_sync.on_text_cursor_moved(offset, origin, doc).is_some() {
            self.refresh_highlight(&mut effects, true);
        }
        effects
    }

    /// Keyboard navigation from the anchor
    pub fn navigate(&mut self, direction: Direction, granularity: Granularity) -> Vec<Effect> {
        let mut effects = Vec::new();
        let Some(from) = self.navigation_source() else {
            log::debug!("SyncCoordinator: nothing to navigate on this page");
            return effects;
        };
        let outcome = match navigation::navigate(
            &self.tree,
            &from,
            direction,
            granularity,
            self.pending_turn.is_some(),
        ) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::warn!("SyncCoordinator: {}", err);
                return effects;
            }
        };
        match outcome {
            NavigationOutcome::Element { id } => {
                self.select_and_show(&id, &mut effects);
                self.refresh_highlight(&mut effects, false);
            }
            NavigationOutcome::PageTurn(turn) => {
                let target = if turn.direction == Direction::Backward {
                    PageTarget::Backwards
                } else {
                    PageTarget::Forwards
                };
                if self.paginator.change_page(target) {
                    self.pending_turn = Some(turn);
                    self.request_page(&mut effects, Some(turn));
                    self.notify_page();
                } else {
                    log::debug!("SyncCoordinator: {}", SyncError::NavigationExhausted(from));
                }
            }
            NavigationOutcome::Exhausted => {
                log::debug!("SyncCoordinator: {}", SyncError::NavigationExhausted(from));
            }
        }
        effects
    }

    /// Anchor if it is on this page, else the start of the page in the
    /// anchor's staff/layer
    fn navigation_source(&self) -> Option<String> {
        let anchor = self.cursor_sync.anchor();
        if let Some(anchor) = anchor.filter(|a| self.tree.contains(a)) {
            return Some(anchor.to_string());
        }
        let staff_layer = anchor.and_then(|a| {
            let doc = self.document.as_ref()?;
            let offset = doc.offset_of(a)?;
            let staff = doc.attribute_above(offset, "staff", "n")?.parse().ok()?;
            let layer = doc.attribute_above(offset, "layer", "n")?.parse().ok()?;
            Some((staff, layer))
        });
        navigation::page_beginning(&self.tree, staff_layer)
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    fn push_playback(&mut self, update: PlaybackUpdate, effects: &mut Vec<Effect>) {
        self.push_highlight(update.change, true, effects);
        effects.extend(update.scheduled.into_iter().map(|task| Effect::ScheduleTask { task }));
        if let Some(id) = update.flip_to {
            // page turns driven by playback must not re-seek the player
            self.locate(&id, false, effects);
        }
        if let Some(id) = update.scroll_to {
            effects.push(Effect::ScrollTo { id });
        }
        if update.start_playback {
            effects.push(Effect::StartPlayback);
        }
        if update.stop_playback {
            effects.push(Effect::StopPlayback);
        }
    }

    pub fn seek(&mut self, t: f64) -> Vec<Effect> {
        let mut effects = vec![Effect::SeekPlayer { time: t }];
        let update = self.playback.seek(t);
        self.push_playback(update, &mut effects);
        effects
    }

    /// Onset report from the player at `t` ms
    pub fn time_advance(&mut self, t: f64) -> Vec<Effect> {
        let mut effects = Vec::new();
        let update = self.playback.on_time_advance(t, &self.tree);
        self.push_playback(update, &mut effects);
        effects
    }

    /// Host timer for a scheduled playback task went off
    pub fn fire_task(&mut self, task_id: u64) -> Vec<Effect> {
        let mut effects = Vec::new();
        let update = self.playback.fire_task(task_id);
        self.push_playback(update, &mut effects);
        effects
    }

    pub fn stop_playback(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        let change = self.playback.stop();
        self.push_highlight(change, true, &mut effects);
        effects
    }

    pub fn request_playback_on_load(&mut self) {
        self.playback.request_playback_on_load();
    }

    /// Seek to the first selected note, else the first note on the page
    pub fn seek_to_selection_or_page(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.seek_to_selection_or_page_into(&mut effects);
        effects
    }

    fn seek_to_selection_or_page_into(&mut self, effects: &mut Vec<Effect>) {
        let selected_note = self
            .cursor_sync
            .selection()
            .ids()
            .iter()
            .find(|id| self.tree.get(id).map_or(false, |e| e.class == "note"))
            .cloned();
        let Some(id) = selected_note.or_else(|| self.tree.first_note().map(str::to_string)) else {
            log::warn!("SyncCoordinator: no note to seek playback to");
            return;
        };
        match self.playback.seek_to_element(&id) {
            Ok(update) => {
                let time = self.playback.cursor().last_reported_time();
                effects.push(Effect::SeekPlayer { time });
                self.push_playback(update, effects);
            }
            Err(err) => log::warn!("SyncCoordinator: cannot seek playback: {}", err),
        }
    }

    pub fn set_highlight_playing(&mut self, on: bool) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.config.highlight_playing = on;
        let change = self.playback.set_highlight_playing(on);
        self.push_highlight(change, true, &mut effects);
        effects
    }

    pub fn set_page_follow(&mut self, on: bool) {
        self.config.page_follow = on;
        self.playback.set_page_follow(on);
    }

    pub fn set_scroll_follow(&mut self, on: bool) {
        self.config.scroll_follow = on;
        self.playback.set_scroll_follow(on);
    }
}
