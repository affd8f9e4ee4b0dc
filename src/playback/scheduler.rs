//! Cancellable playback tasks
//!
//! Every task remembers the playback generation it was scheduled in. A seek
//! bumps the generation, so tasks from before the seek are dropped whether
//! the host timer still fires them or not.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TaskKind {
    /// Stop highlighting a note that gets no further onset callback
    NoteOff { id: String },
    /// End of the timemap: stop the player
    Stop,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    pub id: u64,
    pub generation: u64,
    /// Playback time (ms) at which the task is due
    pub due: f64,
    /// Delay from scheduling (ms), for host timers
    pub delay: f64,
    pub kind: TaskKind,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `kind` to run `delay` ms after playback time `now`
    pub fn schedule(&mut self, generation: u64, now: f64, delay: f64, kind: TaskKind) -> ScheduledTask {
        let delay = delay.max(0.0);
        self.next_id += 1;
        let task = ScheduledTask {
            id: self.next_id,
            generation,
            due: now + delay,
            delay,
            kind,
        };
        log::debug!("Scheduler: task {} {:?} in {} ms", task.id, task.kind, delay);
        self.tasks.push(task.clone());
        task
    }

    /// Remove a task fired by the host; `None` if unknown or from an old generation
    pub fn take(&mut self, task_id: u64, generation: u64) -> Option<TaskKind> {
        let pos = self.tasks.iter().position(|t| t.id == task_id)?;
        let task = self.tasks.remove(pos);
        if task.generation == generation {
            Some(task.kind)
        } else {
            log::debug!("Scheduler: dropping task {} of generation {}", task.id, task.generation);
            None
        }
    }

    /// Remove and return every current-generation task due at `now`, in due order
    pub fn take_due(&mut self, now: f64, generation: u64) -> Vec<TaskKind> {
        let (mut due, rest): (Vec<ScheduledTask>, Vec<ScheduledTask>) =
            std::mem::take(&mut self.tasks).into_iter().partition(|t| t.due <= now);
        self.tasks = rest;
        due.retain(|t| t.generation == generation);
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)));
        due.into_iter().map(|t| t.kind).collect()
    }

    /// Drop all pending tasks; returns how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }

    pub fn pending(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    pub fn has_stop(&self, generation: u64) -> bool {
        self.tasks
            .iter()
            .any(|t| t.generation == generation && t.kind == TaskKind::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_old_generation_is_dropped() {
        let mut s = Scheduler::new();
        let old = s.schedule(1, 0.0, 100.0, TaskKind::Stop);
        let new = s.schedule(2, 0.0, 100.0, TaskKind::NoteOff { id: "n1".into() });
        assert_eq!(s.take(old.id, 2), None);
        assert_eq!(s.take(new.id, 2), Some(TaskKind::NoteOff { id: "n1".into() }));
        assert!(s.pending().is_empty());
    }

    #[test]
    fn test_take_due_in_order() {
        let mut s = Scheduler::new();
        s.schedule(1, 0.0, 300.0, TaskKind::Stop);
        s.schedule(1, 0.0, 100.0, TaskKind::NoteOff { id: "a".into() });
        s.schedule(1, 0.0, 500.0, TaskKind::NoteOff { id: "b".into() });
        let due = s.take_due(300.0, 1);
        assert_eq!(due, vec![TaskKind::NoteOff { id: "a".into() }, TaskKind::Stop]);
        assert_eq!(s.pending().len(), 1);
        assert_eq!(s.cancel_all(), 1);
    }

    #[test]
    fn test_negative_delay_is_immediate() {
        let mut s = Scheduler::new();
        let task = s.schedule(0, 50.0, -10.0, TaskKind::Stop);
        assert_eq!(task.delay, 0.0);
        assert_eq!(task.due, 50.0);
    }
}
