//! Read-only view of pump state — for summaries, IPC replies and tests.
//!
//! This is a diagnostic view, not a resumable snapshot: there is no
//! way to rebuild a pump from it.

use serde::{Deserialize, Serialize};

use crate::{
    config::TimeMode,
    types::{Millis, StepIndex, TurnIndex},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PumpStatus {
    pub started:                 bool,
    pub step_count:              StepIndex,
    pub simulated_millis:        Millis,
    pub observed_elapsed_millis: Millis,
    pub simulated_turn:          TurnIndex,
    pub observed_turn:           TurnIndex,
    pub next_turn_threshold:     TurnIndex,
    pub locked:                  bool,
    pub use_lock_gate:           bool,
    pub time_mode:               TimeMode,
    pub fixed_step_millis:       Millis,
    pub turn_duration_millis:    Millis,
}

impl PumpStatus {
    /// Undrained observed time.
    pub fn backlog_millis(&self) -> Millis {
        self.observed_elapsed_millis.saturating_sub(self.simulated_millis)
    }

    /// True when the next tick will be a no-op until release.
    pub fn is_gated(&self) -> bool {
        self.use_lock_gate && self.locked
    }
}
