//! Pump events — a serializable record of everything the pump did.
//!
//! The pump itself only calls back; recording is opt-in through an
//! EventLog whose recorders are registered as the pump's callbacks.

use serde::{Deserialize, Serialize};
use std::{cell::RefCell, rc::Rc};

use crate::{
    config::TimeMode,
    error::PumpResult,
    types::{Millis, StepIndex, TurnIndex, TurnLag},
};

/// Variants are appended only — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PumpEvent {
    Step {
        step_index:   StepIndex,
        turn_lag:     TurnLag,
        step_seconds: f64,
    },
    TurnCrossed {
        turn: TurnIndex,
    },
    GateReleased,
    RolledBack {
        elapsed_millis: Millis,
    },
    ElapsedCorrected {
        elapsed_millis: Millis,
    },
    ElapsedSkipped {
        skip_millis: Millis,
    },
    TimeModeChanged {
        mode: TimeMode,
    },
}

impl PumpEvent {
    /// Stable name for the variant, matching its serialized tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            PumpEvent::Step { .. }             => "step",
            PumpEvent::TurnCrossed { .. }      => "turn_crossed",
            PumpEvent::GateReleased            => "gate_released",
            PumpEvent::RolledBack { .. }       => "rolled_back",
            PumpEvent::ElapsedCorrected { .. } => "elapsed_corrected",
            PumpEvent::ElapsedSkipped { .. }   => "elapsed_skipped",
            PumpEvent::TimeModeChanged { .. }  => "time_mode_changed",
        }
    }
}

/// Shared, append-only event log.
///
/// Cloning shares the same underlying log, so a clone can be moved
/// into each pump callback while the host keeps another for reading.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Rc<RefCell<Vec<PumpEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: PumpEvent) {
        self.entries.borrow_mut().push(event);
    }

    /// Step callback that records every step.
    pub fn step_recorder(&self) -> impl FnMut(f64, TurnLag, StepIndex) + 'static {
        let log = self.clone();
        move |step_seconds, turn_lag, step_index| {
            log.push(PumpEvent::Step { step_index, turn_lag, step_seconds });
        }
    }

    /// Turn callback that records every boundary.
    pub fn turn_recorder(&self) -> impl FnMut(TurnIndex) + 'static {
        let log = self.clone();
        move |turn| log.push(PumpEvent::TurnCrossed { turn })
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Copy of every entry recorded so far.
    pub fn entries(&self) -> Vec<PumpEvent> {
        self.entries.borrow().clone()
    }

    /// Remove and return every entry recorded so far.
    pub fn drain(&self) -> Vec<PumpEvent> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }

    /// Turn indices in the order they were crossed.
    pub fn turns(&self) -> Vec<TurnIndex> {
        self.entries
            .borrow()
            .iter()
            .filter_map(|e| match e {
                PumpEvent::TurnCrossed { turn } => Some(*turn),
                _ => None,
            })
            .collect()
    }

    /// Step indices in the order they were emitted.
    pub fn steps(&self) -> Vec<StepIndex> {
        self.entries
            .borrow()
            .iter()
            .filter_map(|e| match e {
                PumpEvent::Step { step_index, .. } => Some(*step_index),
                _ => None,
            })
            .collect()
    }

    /// One JSON document per entry.
    pub fn to_json_lines(&self) -> PumpResult<Vec<String>> {
        let lines = self
            .entries
            .borrow()
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }
}
