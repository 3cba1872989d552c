use serde::{Deserialize, Serialize};

use crate::{
    error::{PumpError, PumpResult},
    types::Millis,
};

/// Where `tick()` gets its elapsed time from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    /// Observed time = clock reading − baseline. Resists drift.
    Monotonic,
    /// Observed time accumulates the clock's per-frame delta.
    #[default]
    FrameDelta,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PumpConfig {
    /// Length of one fixed step, in seconds.
    pub fixed_step_seconds:   f64,
    /// Length of one turn, in milliseconds.
    pub turn_duration_millis: Millis,
    /// Close the gate on every turn boundary and wait for `release()`.
    pub use_lock_gate:        bool,
    pub time_mode:            TimeMode,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            fixed_step_seconds:   0.033,
            turn_duration_millis: 250,
            use_lock_gate:        false,
            time_mode:            TimeMode::FrameDelta,
        }
    }
}

impl PumpConfig {
    pub fn new(fixed_step_seconds: f64, turn_duration_millis: Millis, use_lock_gate: bool) -> Self {
        Self {
            fixed_step_seconds,
            turn_duration_millis,
            use_lock_gate,
            ..Self::default()
        }
    }

    pub fn with_time_mode(mut self, time_mode: TimeMode) -> Self {
        self.time_mode = time_mode;
        self
    }

    /// Load from a JSON file. Missing fields take their defaults.
    /// In tests, use PumpConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config = Self::from_json(&content)?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> PumpResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 33ms steps, 250ms turns, gate off, monotonic mode.
    pub fn default_test() -> Self {
        Self::new(0.033, 250, false).with_time_mode(TimeMode::Monotonic)
    }

    /// The fixed step in whole milliseconds (truncated).
    pub fn fixed_step_millis(&self) -> Millis {
        // Float-to-int `as` saturates; NaN becomes 0.
        (self.fixed_step_seconds * 1000.0) as Millis
    }

    /// Both step and turn length are divisors in the drain loop.
    /// Zero would divide by zero or never drain, so reject it here.
    pub fn validate(&self) -> PumpResult<()> {
        if !self.fixed_step_seconds.is_finite() || self.fixed_step_seconds <= 0.0 {
            return Err(PumpError::InvalidFixedStep { seconds: self.fixed_step_seconds });
        }
        if self.fixed_step_millis() == 0 {
            return Err(PumpError::FixedStepBelowResolution { seconds: self.fixed_step_seconds });
        }
        if self.turn_duration_millis == 0 {
            return Err(PumpError::InvalidTurnDuration);
        }
        if self.fixed_step_millis() > self.turn_duration_millis {
            log::warn!(
                "fixed step {}ms is longer than a turn ({}ms); a single step may cross several turns",
                self.fixed_step_millis(),
                self.turn_duration_millis
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_sample_settings() {
        let config = PumpConfig::default();
        assert_eq!(config.fixed_step_millis(), 33);
        assert_eq!(config.turn_duration_millis, 250);
        assert!(!config.use_lock_gate);
        assert_eq!(config.time_mode, TimeMode::FrameDelta);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn fixed_step_millis_truncates() {
        assert_eq!(PumpConfig::new(0.0169, 250, false).fixed_step_millis(), 16);
        assert_eq!(PumpConfig::new(0.1, 250, false).fixed_step_millis(), 100);
    }

    #[test]
    fn rejects_zero_turn_duration() {
        let err = PumpConfig::new(0.033, 0, false).validate().unwrap_err();
        assert!(matches!(err, PumpError::InvalidTurnDuration), "got {err:?}");
    }

    #[test]
    fn rejects_non_positive_or_nan_step() {
        for seconds in [0.0, -0.016, f64::NAN, f64::INFINITY] {
            let err = PumpConfig::new(seconds, 250, false).validate().unwrap_err();
            assert!(matches!(err, PumpError::InvalidFixedStep { .. }), "{seconds}: got {err:?}");
        }
    }

    #[test]
    fn rejects_sub_millisecond_step() {
        let err = PumpConfig::new(0.0004, 250, false).validate().unwrap_err();
        assert!(matches!(err, PumpError::FixedStepBelowResolution { .. }), "got {err:?}");
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config = PumpConfig::from_json(r#"{ "use_lock_gate": true, "time_mode": "monotonic" }"#)
            .expect("parse");
        assert!(config.use_lock_gate);
        assert_eq!(config.time_mode, TimeMode::Monotonic);
        assert_eq!(config.turn_duration_millis, 250);
        assert_eq!(config.fixed_step_seconds, 0.033);
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = PumpConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, PumpError::Serialization(_)), "got {err:?}");
    }

    #[test]
    fn missing_file_is_reported() {
        let err = PumpConfig::load("/nonexistent/pump.json").unwrap_err();
        assert!(err.to_string().contains("Cannot read"), "got {err}");
    }
}
