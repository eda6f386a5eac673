//! Countdown arithmetic.
//!
//! Remaining time is always derived from the authoritative target timestamp
//! and the current wall clock, never from a locally decremented counter, so
//! a countdown cannot drift away from server time.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownMode {
    /// No next event is scheduled.
    Unscheduled,
    /// Time left until the next event.
    Counting,
    /// Target reached but the server has not reported the conversation yet.
    Starting,
    /// Target reached and the conversation is active.
    Live,
}

/// Output of one countdown evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountdownTick {
    pub remaining_secs: u64,
    pub mode: CountdownMode,
    pub target: Option<DateTime<Utc>>,
    pub at: DateTime<Utc>,
}

impl CountdownTick {
    pub fn display(&self) -> String {
        format_remaining(self.remaining_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    target: Option<DateTime<Utc>>,
}

impl Countdown {
    pub fn new(target: Option<DateTime<Utc>>) -> Self {
        Self { target }
    }

    pub fn target(&self) -> Option<DateTime<Utc>> {
        self.target
    }

    /// Replaces the target. Returns whether it changed.
    pub fn reanchor(&mut self, target: Option<DateTime<Utc>>) -> bool {
        let changed = self.target != target;
        self.target = target;
        changed
    }

    /// Whole seconds left until the target, never negative.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        match self.target {
            Some(target) => (target - now).num_seconds().max(0) as u64,
            None => 0,
        }
    }

    pub fn tick(&self, now: DateTime<Utc>, active: bool) -> CountdownTick {
        let remaining_secs = self.remaining_secs(now);
        let mode = match (self.target, remaining_secs, active) {
            (_, 0, true) => CountdownMode::Live,
            (None, _, false) => CountdownMode::Unscheduled,
            (Some(_), 0, false) => CountdownMode::Starting,
            _ => CountdownMode::Counting,
        };
        CountdownTick {
            remaining_secs,
            mode,
            target: self.target,
            at: now,
        }
    }
}

/// `MM:SS`, or `HH:MM:SS` once an hour or more is left.
pub fn format_remaining(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
