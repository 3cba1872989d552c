use serde::{Deserialize, Serialize};

use crate::{
    clock::ElapsedClock,
    config::TimeMode,
    error::PumpResult,
    event::PumpEvent,
    pump::FramePump,
    types::Millis,
};

/// Everything a host (or a sync layer above it) can ask of a pump.
/// Variants are appended only — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum HostCommand {
    Tick,
    Release,
    Rollback    { elapsed_millis: Millis },
    SetElapsed  { elapsed_millis: Millis },
    SkipElapsed { skip_millis: Millis },
    SetTimeMode { mode: TimeMode },
}

impl HostCommand {
    /// Execute against `pump`. Returns the event describing the command,
    /// if any. Steps and turns from `Tick` arrive through the callbacks.
    pub fn apply<C: ElapsedClock>(&self, pump: &mut FramePump<C>) -> PumpResult<Option<PumpEvent>> {
        let event = match *self {
            HostCommand::Tick => {
                pump.tick()?;
                None
            }
            HostCommand::Release => {
                pump.release();
                Some(PumpEvent::GateReleased)
            }
            HostCommand::Rollback { elapsed_millis } => {
                pump.rollback(elapsed_millis)?;
                Some(PumpEvent::RolledBack { elapsed_millis })
            }
            HostCommand::SetElapsed { elapsed_millis } => {
                pump.set_elapsed_time(elapsed_millis)?;
                Some(PumpEvent::ElapsedCorrected { elapsed_millis })
            }
            HostCommand::SkipElapsed { skip_millis } => {
                pump.skip_elapsed_time(skip_millis)?;
                Some(PumpEvent::ElapsedSkipped { skip_millis })
            }
            HostCommand::SetTimeMode { mode } => {
                pump.set_time_mode(mode);
                Some(PumpEvent::TimeModeChanged { mode })
            }
        };
        Ok(event)
    }
}
