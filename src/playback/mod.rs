//! Playback synchronization
//!
//! Drives note highlighting from the timemap while audio plays. The player
//! reports onset times; between reports, notes that end without a following
//! onset are closed by scheduled tasks.
//!
//! ## States
//!
//! ```text
//! Idle --seek--> Seeking --advance--> Playing --stop/end--> Idle
//!                   ^                    |
//!                   +-------seek---------+
//! ```
//!
//! The highlighted set is always the set of notes whose onset has been
//! processed and whose offset has not. A seek or a rewind empties it and the
//! next report replays the timemap from the start up to the reported time.

pub mod scheduler;

pub use scheduler::{ScheduledTask, Scheduler, TaskKind};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::models::{ExpansionAliasMap, PlaybackCursor, RenderedTree, Timemap};
use crate::sync::HighlightChange;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Seeking,
    Playing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackOptions {
    pub highlight_playing: bool,
    pub page_follow: bool,
    pub scroll_follow: bool,
    /// Timestamp tolerance (ms)
    pub tolerance: f64,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for PlaybackOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            highlight_playing: config.highlight_playing,
            page_follow: config.page_follow,
            scroll_follow: config.scroll_follow,
            tolerance: config.seek_tolerance_ms,
        }
    }
}

/// What the host has to do after a playback event
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackUpdate {
    pub change: HighlightChange,
    pub scheduled: Vec<ScheduledTask>,
    /// A newly sounding note is not on the current page
    pub flip_to: Option<String>,
    /// Measure to scroll into view
    pub scroll_to: Option<String>,
    pub start_playback: bool,
    pub stop_playback: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PlaybackSynchronizer {
    timemap: Timemap,
    aliases: ExpansionAliasMap,
    cursor: PlaybackCursor,
    state: PlaybackState,
    /// Notated ids currently sounding, in onset order
    highlighted: Vec<String>,
    /// Number of time points already applied to `highlighted`
    processed: usize,
    scheduler: Scheduler,
    options: PlaybackOptions,
    play_on_load: bool,
}

impl PlaybackSynchronizer {
    pub fn new(options: PlaybackOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    pub fn timemap(&self) -> &Timemap {
        &self.timemap
    }

    pub fn highlighted(&self) -> &[String] {
        &self.highlighted
    }

    pub fn options(&self) -> PlaybackOptions {
        self.options
    }

    pub fn pending_tasks(&self) -> &[ScheduledTask] {
        self.scheduler.pending()
    }

    /// Install a freshly computed timemap; playback state starts over
    pub fn set_timemap(&mut self, timemap: Timemap, aliases: Option<ExpansionAliasMap>) -> HighlightChange {
        log::info!("PlaybackSynchronizer: timemap with {} points", timemap.len());
        self.timemap = timemap;
        self.aliases = aliases.unwrap_or_default();
        self.invalidate();
        self.cursor.index = 0;
        self.cursor.last_reported_time = 0.0;
        self.state = PlaybackState::Idle;
        self.clear_highlight()
    }

    /// Void scheduled tasks and force a replay on the next report
    fn invalidate(&mut self) {
        self.cursor.generation += 1;
        let dropped = self.scheduler.cancel_all();
        if dropped > 0 {
            log::debug!("PlaybackSynchronizer: cancelled {} tasks", dropped);
        }
        self.processed = 0;
    }

    fn clear_highlight(&mut self) -> HighlightChange {
        let removed = std::mem::take(&mut self.highlighted);
        if self.options.highlight_playing {
            HighlightChange { added: Vec::new(), removed }
        } else {
            HighlightChange::default()
        }
    }

    /// Jump to playback time `t` (ms)
    pub fn seek(&mut self, t: f64) -> PlaybackUpdate {
        self.invalidate();
        self.cursor.index = self.timemap.first_at_or_after(t - self.options.tolerance);
        self.cursor.last_reported_time = t;
        self.state = PlaybackState::Seeking;
        log::debug!("PlaybackSynchronizer: seek to {} ms, index {}", t, self.cursor.index);
        PlaybackUpdate {
            change: self.clear_highlight(),
            start_playback: std::mem::take(&mut self.play_on_load),
            ..Default::default()
        }
    }

    /// Seek to the first onset of a notated element
    pub fn seek_to_element(&mut self, id: &str) -> SyncResult<PlaybackUpdate> {
        let t = self
            .timemap
            .time_of(id)
            .or_else(|| {
                // expanded repeats: any playback id that resolves to `id`
                self.timemap
                    .points()
                    .iter()
                    .find(|p| p.on.iter().any(|o| self.aliases.resolve(o) == id))
                    .map(|p| p.tstamp)
            })
            .ok_or_else(|| SyncError::ElementNotFound(id.to_string()))?;
        Ok(self.seek(t))
    }

    /// Start the player as soon as the next seek happens
    pub fn request_playback_on_load(&mut self) {
        self.play_on_load = true;
    }

    /// Handle an onset report at playback time `t` (ms)
    pub fn on_time_advance(&mut self, t: f64, tree: &RenderedTree) -> PlaybackUpdate {
        let before = self.highlighted.clone();
        if t < self.cursor.last_reported_time {
            log::debug!("PlaybackSynchronizer: rewind {} -> {} ms", self.cursor.last_reported_time, t);
            self.invalidate();
            self.cursor.index = 0;
            self.highlighted.clear();
        }
        self.cursor.last_reported_time = t;
        self.state = PlaybackState::Playing;

        let tolerance = self.options.tolerance;
        let points = self.timemap.points();
        let mut index = self.cursor.index;
        while index < points.len() && points[index].tstamp + tolerance <= t {
            index += 1;
        }
        self.cursor.index = index;
        let current = if index < points.len() && points[index].tstamp <= t + tolerance {
            Some(index)
        } else {
            index.checked_sub(1)
        };

        let mut update = PlaybackUpdate::default();
        let Some(current) = current.filter(|&c| c >= self.processed) else {
            return update;
        };
        // notated id -> (playback id, point index) of its latest replayed onset
        let mut onsets: HashMap<String, (String, usize)> = HashMap::new();
        for (offset, point) in points[self.processed..=current].iter().enumerate() {
            let at = self.processed + offset;
            for raw in &point.off {
                let id = self.aliases.resolve(raw);
                self.highlighted.retain(|h| h != id);
                onsets.remove(id);
            }
            for raw in &point.on {
                let id = self.aliases.resolve(raw);
                if !self.highlighted.iter().any(|h| h == id) {
                    self.highlighted.push(id.to_string());
                }
                onsets.insert(id.to_string(), (raw.clone(), at));
            }
        }
        self.processed = current + 1;

        let added: Vec<String> = self
            .highlighted
            .iter()
            .filter(|id| !before.contains(id))
            .cloned()
            .collect();
        let removed: Vec<String> = before
            .iter()
            .filter(|id| !self.highlighted.contains(id))
            .cloned()
            .collect();

        update.scheduled = self.schedule_lookahead(current, t, &onsets);
        if self.options.page_follow {
            update.flip_to = added.iter().find(|id| !tree.contains(id)).cloned();
        }
        if self.options.scroll_follow {
            update.scroll_to = self.timemap.points()[current]
                .on
                .first()
                .and_then(|raw| tree.index_of(self.aliases.resolve(raw)))
                .and_then(|idx| tree.closest(idx, "measure"))
                .map(|m| tree.element(m).id.clone());
        }
        if self.options.highlight_playing {
            update.change = HighlightChange { added, removed };
        }
        update
    }

    /// Tasks for notes that end without another onset report
    ///
    /// Covers every note whose onset was replayed by this report, so notes
    /// already sounding at a seek target get closed as well.
    fn schedule_lookahead(
        &mut self,
        current: usize,
        t: f64,
        onsets: &HashMap<String, (String, usize)>,
    ) -> Vec<ScheduledTask> {
        let generation = self.cursor.generation;
        let points = self.timemap.points();
        let mut note_offs: Vec<(String, f64)> = Vec::new();
        for id in &self.highlighted {
            let Some((raw, at)) = onsets.get(id) else {
                continue;
            };
            if let Some(off) = self.timemap.offset_after(raw, *at) {
                // an onset report arrives at that point anyway
                if points[off].on.is_empty() {
                    note_offs.push((id.clone(), points[off].tstamp - t));
                }
            }
        }

        let mut stop_at = None;
        if Some(current) == self.timemap.last_onset_index() && !self.scheduler.has_stop(generation) {
            for point in &points[current + 1..] {
                for raw in &point.off {
                    let id = self.aliases.resolve(raw);
                    if self.highlighted.iter().any(|h| h == id) && !note_offs.iter().any(|(n, _)| n == id) {
                        note_offs.push((id.to_string(), point.tstamp - t));
                    }
                }
            }
            stop_at = self.timemap.final_tstamp().map(|end| end - t);
        }

        let mut scheduled: Vec<ScheduledTask> = note_offs
            .into_iter()
            .map(|(id, delay)| self.scheduler.schedule(generation, t, delay, TaskKind::NoteOff { id }))
            .collect();
        if let Some(delay) = stop_at {
            scheduled.push(self.scheduler.schedule(generation, t, delay, TaskKind::Stop));
        }
        scheduled
    }

    fn apply_task(&mut self, kind: TaskKind, update: &mut PlaybackUpdate) {
        match kind {
            TaskKind::NoteOff { id } => {
                if let Some(pos) = self.highlighted.iter().position(|h| *h == id) {
                    self.highlighted.remove(pos);
                    if self.options.highlight_playing {
                        update.change.removed.push(id);
                    }
                }
            }
            TaskKind::Stop => {
                log::info!("PlaybackSynchronizer: end of timemap");
                self.state = PlaybackState::Idle;
                update.stop_playback = true;
            }
        }
    }

    /// A host timer for `task_id` went off
    pub fn fire_task(&mut self, task_id: u64) -> PlaybackUpdate {
        let mut update = PlaybackUpdate::default();
        if let Some(kind) = self.scheduler.take(task_id, self.cursor.generation) {
            self.apply_task(kind, &mut update);
        }
        update
    }

    /// Run every task due at playback time `now` (ms)
    pub fn advance_clock(&mut self, now: f64) -> PlaybackUpdate {
        let mut update = PlaybackUpdate::default();
        for kind in self.scheduler.take_due(now, self.cursor.generation) {
            self.apply_task(kind, &mut update);
        }
        update
    }

    /// Player stopped by the user
    pub fn stop(&mut self) -> HighlightChange {
        self.invalidate();
        self.state = PlaybackState::Idle;
        self.clear_highlight()
    }

    /// Toggle highlighting; switching it off clears what is shown,
    /// switching it on shows what is sounding
    pub fn set_highlight_playing(&mut self, on: bool) -> HighlightChange {
        let was = self.options.highlight_playing;
        self.options.highlight_playing = on;
        match (was, on) {
            (true, false) => HighlightChange {
                added: Vec::new(),
                removed: self.highlighted.clone(),
            },
            (false, true) => HighlightChange {
                added: self.highlighted.clone(),
                removed: Vec::new(),
            },
            _ => HighlightChange::default(),
        }
    }

    pub fn set_page_follow(&mut self, on: bool) {
        self.options.page_follow = on;
    }

    pub fn set_scroll_follow(&mut self, on: bool) {
        self.options.scroll_follow = on;
    }
}
