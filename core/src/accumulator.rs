//! Simulated-vs-observed time bookkeeping.
//!
//! RULE: simulated time only ever moves in whole fixed steps,
//! so `simulated_millis` is always a multiple of `fixed_step_millis`.

use crate::types::Millis;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulator {
    fixed_step_millis: Millis,
    simulated_millis:  Millis,
    observed_millis:   Millis,
}

impl Accumulator {
    pub fn new(fixed_step_millis: Millis) -> Self {
        debug_assert!(fixed_step_millis > 0, "fixed step must be validated before use");
        Self {
            fixed_step_millis,
            simulated_millis: 0,
            observed_millis:  0,
        }
    }

    /// Zero both clocks. Used when a new baseline is established.
    pub fn reset(&mut self) {
        self.simulated_millis = 0;
        self.observed_millis = 0;
    }

    /// Restart simulated time at zero against a new observed value.
    pub fn restart_at(&mut self, observed_millis: Millis) {
        self.simulated_millis = 0;
        self.observed_millis = observed_millis;
    }

    pub fn set_observed(&mut self, observed_millis: Millis) {
        self.observed_millis = observed_millis;
    }

    pub fn add_observed(&mut self, delta_millis: Millis) {
        self.observed_millis = self.observed_millis.saturating_add(delta_millis);
    }

    /// True while simulated time trails observed time.
    pub fn has_backlog(&self) -> bool {
        self.simulated_millis < self.observed_millis
    }

    /// Drain one fixed step. Returns the new simulated time.
    pub fn advance_step(&mut self) -> Millis {
        self.simulated_millis += self.fixed_step_millis;
        self.simulated_millis
    }

    /// Undrained observed time, in milliseconds.
    pub fn backlog_millis(&self) -> Millis {
        self.observed_millis.saturating_sub(self.simulated_millis)
    }

    pub fn fixed_step_millis(&self) -> Millis { self.fixed_step_millis }
    pub fn simulated_millis(&self)  -> Millis { self.simulated_millis }
    pub fn observed_millis(&self)   -> Millis { self.observed_millis }
}
