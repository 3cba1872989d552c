//! Shared primitive types used across the pump.

/// A duration or instant in whole milliseconds.
pub type Millis = u64;

/// Index of a turn. Turn 0 spans `[0, turn_duration_millis)`.
pub type TurnIndex = u64;

/// Zero-based index of an emitted fixed step.
pub type StepIndex = u64;

/// Observed turn minus simulated turn. Positive means the simulation is behind.
pub type TurnLag = i64;

/// Called once per drained fixed step with `(step_seconds, turn_lag, step_index)`.
pub type StepCallback = Box<dyn FnMut(f64, TurnLag, StepIndex)>;

/// Called once per crossed turn boundary with the new turn index.
pub type TurnCallback = Box<dyn FnMut(TurnIndex)>;
