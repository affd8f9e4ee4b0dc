//! Quiet-period timers for edit bursts

use serde::{Deserialize, Serialize};

/// Timer the host should start
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DebounceTimer {
    pub token: u64,
    pub delay: f64,
}

/// Restarts on every poke; only the deadline of the last poke fires
#[derive(Clone, Debug)]
pub struct Debouncer {
    quiet_ms: f64,
    token: u64,
    deadline: Option<f64>,
}

impl Debouncer {
    pub fn new(quiet_ms: f64) -> Self {
        Self {
            quiet_ms,
            token: 0,
            deadline: None,
        }
    }

    pub fn poke(&mut self, now: f64) -> DebounceTimer {
        self.token += 1;
        self.deadline = Some(now + self.quiet_ms);
        DebounceTimer {
            token: self.token,
            delay: self.quiet_ms,
        }
    }

    /// Host timer `token` went off; true only for the last poke
    pub fn fire(&mut self, token: u64) -> bool {
        if token == self.token && self.deadline.is_some() {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    /// Logical clock variant of `fire`
    pub fn poll(&mut self, now: f64) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}
