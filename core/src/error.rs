use thiserror::Error;

use crate::{clock::ClockError, types::Millis};

#[derive(Error, Debug)]
pub enum PumpError {
    #[error("Invalid fixed step: {seconds}s (must be finite and > 0)")]
    InvalidFixedStep { seconds: f64 },

    #[error("Fixed step {seconds}s truncates to 0ms")]
    FixedStepBelowResolution { seconds: f64 },

    #[error("Invalid turn duration: must be > 0ms")]
    InvalidTurnDuration,

    #[error("Pump not started: call start_check_time() before ticking")]
    NotStarted,

    #[error("Elapsed value {millis}ms out of range")]
    ElapsedOverflow { millis: Millis },

    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PumpResult<T> = Result<T, PumpError>;
