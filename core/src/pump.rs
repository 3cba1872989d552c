//! The frame pump — turns elapsed-time observations into fixed steps.
//!
//! ORDER OF WORK PER TICK (fixed, never reordered):
//!   1. Lock gate   — a closed gate makes the tick a no-op.
//!   2. Clock       — pull elapsed time (monotonic read or frame delta).
//!   3. Drain       — emit fixed steps until simulated time catches up.
//!   4. Turns       — each step may cross a turn boundary, which fires
//!                    the turn callback and may close the gate.
//!
//! RULES:
//!   - All callbacks run synchronously, in-line, before tick() returns.
//!   - The step counter never decreases and is only reset by reinitialize().
//!   - While the gate is closed, observed time is frozen. In frame-delta
//!     mode the frame's delta is still taken from the clock and dropped.

use std::cell::Cell;

use crate::{
    accumulator::Accumulator,
    clock::{ClockError, ElapsedClock},
    config::{PumpConfig, TimeMode},
    error::{PumpError, PumpResult},
    gate::LockGate,
    status::PumpStatus,
    turn::TurnTracker,
    types::{Millis, StepCallback, StepIndex, TurnCallback, TurnIndex, TurnLag},
};

/// What a single `tick()` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Index of the first step emitted (or that would have been emitted).
    pub first_step: StepIndex,
    /// Number of steps emitted.
    pub steps:      u64,
    /// Turn boundaries crossed, in order.
    pub turns:      Vec<TurnIndex>,
    /// The tick was skipped because the lock gate is closed.
    pub gated:      bool,
}

impl TickReport {
    fn starting_at(first_step: StepIndex) -> Self {
        Self { first_step, ..Self::default() }
    }

    fn gated(first_step: StepIndex) -> Self {
        Self { first_step, gated: true, ..Self::default() }
    }
}

pub struct FramePump<C: ElapsedClock> {
    config:       PumpConfig,
    clock:        C,
    accumulator:  Accumulator,
    turns:        TurnTracker,
    gate:         LockGate,
    time_mode:    TimeMode,
    step_count:   StepIndex,
    /// Clock reading that defines simulation zero. None until started.
    baseline:     Option<i64>,
    last_reading: Cell<Option<Millis>>,
    on_step:      StepCallback,
    on_turn:      Option<TurnCallback>,
}

impl<C: ElapsedClock> FramePump<C> {
    /// Validate `config` and build a pump. No pump exists for a bad config.
    pub fn new<F>(config: PumpConfig, clock: C, on_step: F) -> PumpResult<Self>
    where
        F: FnMut(f64, TurnLag, StepIndex) + 'static,
    {
        config.validate()?;
        log::debug!(
            "pump init: step={}ms turn={}ms gate={} mode={:?}",
            config.fixed_step_millis(),
            config.turn_duration_millis,
            config.use_lock_gate,
            config.time_mode
        );
        Ok(Self {
            accumulator:  Accumulator::new(config.fixed_step_millis()),
            turns:        TurnTracker::new(config.turn_duration_millis),
            gate:         LockGate::new(config.use_lock_gate),
            time_mode:    config.time_mode,
            step_count:   0,
            baseline:     None,
            last_reading: Cell::new(None),
            on_step:      Box::new(on_step),
            on_turn:      None,
            clock,
            config,
        })
    }

    /// Register (or replace) the turn-boundary callback.
    pub fn register_turn_callback<F>(&mut self, on_turn: F)
    where
        F: FnMut(TurnIndex) + 'static,
    {
        self.on_turn = Some(Box::new(on_turn));
    }

    pub fn clear_turn_callback(&mut self) {
        self.on_turn = None;
    }

    /// Re-run initialization with a new config, keeping clock and callbacks.
    /// On error the pump is left exactly as it was.
    pub fn reinitialize(&mut self, config: PumpConfig) -> PumpResult<()> {
        config.validate()?;
        self.accumulator = Accumulator::new(config.fixed_step_millis());
        self.turns = TurnTracker::new(config.turn_duration_millis);
        self.gate = LockGate::new(config.use_lock_gate);
        self.time_mode = config.time_mode;
        self.step_count = 0;
        self.baseline = None;
        self.config = config;
        log::debug!("pump reinitialized; start_check_time() required");
        Ok(())
    }

    /// Establish simulation zero at the current clock reading.
    pub fn start_check_time(&mut self) -> PumpResult<()> {
        let now = self.read_clock()?;
        self.baseline = Some(to_signed(now)?);
        self.accumulator.reset();
        self.clock.reset_frame();
        log::debug!("pump started at clock={now}ms");
        Ok(())
    }

    /// Advance the pump by whatever time passed since the last tick.
    pub fn tick(&mut self) -> PumpResult<TickReport> {
        let baseline = self.baseline.ok_or(PumpError::NotStarted)?;

        if self.gate.is_blocking() {
            if self.time_mode == TimeMode::FrameDelta {
                let dropped = self.clock.frame_delta_millis()?;
                log::trace!("gated frame: dropped {dropped}ms");
            }
            return Ok(TickReport::gated(self.step_count));
        }

        match self.time_mode {
            TimeMode::Monotonic => {
                let elapsed = self.elapsed_since(baseline)?;
                self.accumulator.set_observed(elapsed);
            }
            TimeMode::FrameDelta => {
                let delta = self.clock.frame_delta_millis()?;
                self.accumulator.add_observed(delta);
            }
        }

        let observed_turn = self.turns.turn_at(self.accumulator.observed_millis());
        let mut report = TickReport::starting_at(self.step_count);

        while self.accumulator.has_backlog() {
            let simulated = self.accumulator.advance_step();
            let crossed = self.turns.observe(simulated);
            let turn_lag = observed_turn as TurnLag - self.turns.current_turn() as TurnLag;

            log::trace!("step={} sim={simulated}ms lag={turn_lag}", self.step_count);
            (self.on_step)(self.config.fixed_step_seconds, turn_lag, self.step_count);
            self.step_count += 1;
            report.steps += 1;

            if let Some(turn) = crossed {
                log::debug!("turn {turn} crossed at sim={simulated}ms");
                if let Some(on_turn) = self.on_turn.as_mut() {
                    on_turn(turn);
                }
                report.turns.push(turn);

                // The crossing step has been emitted; the rest of the backlog
                // stays queued until release() (DESIGN.md decision 4).
                if self.gate.close() {
                    log::debug!("lock gate closed at turn {turn}");
                    break;
                }
            }
        }

        Ok(report)
    }

    /// Open the lock gate. Idempotent.
    pub fn release(&mut self) {
        if self.gate.release() {
            log::debug!("lock gate released at step {}", self.step_count);
        }
    }

    /// Resynchronize to an authoritative elapsed time.
    ///
    /// Simulated time restarts from zero and re-drains up to `target`.
    /// The step counter and turn thresholds are kept, so turns already
    /// announced are not announced again while re-draining.
    pub fn rollback(&mut self, target_elapsed: Millis) -> PumpResult<()> {
        self.require_started()?;
        let now = to_signed(self.read_clock()?)?;
        self.baseline = Some(now - to_signed(target_elapsed)?);
        self.accumulator.restart_at(target_elapsed);
        log::debug!("rollback to elapsed={target_elapsed}ms (step_count={})", self.step_count);
        Ok(())
    }

    /// Forward-only correction: pulls local elapsed time up to
    /// `authoritative_elapsed`. Corrections backwards are ignored.
    pub fn set_elapsed_time(&mut self, authoritative_elapsed: Millis) -> PumpResult<()> {
        let baseline = self.require_started()?;
        let current = self.elapsed_since(baseline)?;
        let delta = to_signed(authoritative_elapsed)? - to_signed(current)?;
        log::debug!("elapsed delta: {delta}ms (authoritative={authoritative_elapsed}ms current={current}ms)");

        if delta > 0 {
            let shifted = baseline
                .checked_sub(delta)
                .ok_or(PumpError::ElapsedOverflow { millis: authoritative_elapsed })?;
            self.baseline = Some(shifted);
        }
        Ok(())
    }

    /// Overwrite observed time with `baseline + skip`, bypassing the clock.
    pub fn skip_elapsed_time(&mut self, skip: Millis) -> PumpResult<()> {
        let baseline = self.require_started()?;
        let observed = baseline.saturating_add(to_signed(skip)?);
        self.accumulator.set_observed(Millis::try_from(observed).unwrap_or(0));
        log::debug!("observed elapsed skipped to {}ms", self.accumulator.observed_millis());
        Ok(())
    }

    /// Clock reading minus baseline.
    pub fn current_elapsed_time(&self) -> PumpResult<Millis> {
        let baseline = self.require_started()?;
        self.elapsed_since(baseline)
    }

    pub fn set_time_mode(&mut self, mode: TimeMode) {
        self.time_mode = mode;
    }

    /// Turn implied by observed elapsed time.
    pub fn current_turn(&self) -> TurnIndex {
        self.turns.turn_at(self.accumulator.observed_millis())
    }

    /// Turn implied by drained simulated time.
    pub fn simulated_turn(&self) -> TurnIndex {
        self.turns.current_turn()
    }

    pub fn turn_for_seconds(&self, seconds: f64) -> TurnIndex {
        self.turns.turn_for_seconds(seconds)
    }

    pub fn status(&self) -> PumpStatus {
        PumpStatus {
            started:                 self.baseline.is_some(),
            step_count:              self.step_count,
            simulated_millis:        self.accumulator.simulated_millis(),
            observed_elapsed_millis: self.accumulator.observed_millis(),
            simulated_turn:          self.simulated_turn(),
            observed_turn:           self.current_turn(),
            next_turn_threshold:     self.turns.next_threshold(),
            locked:                  self.gate.is_locked(),
            use_lock_gate:           self.gate.is_enabled(),
            time_mode:               self.time_mode,
            fixed_step_millis:       self.accumulator.fixed_step_millis(),
            turn_duration_millis:    self.turns.turn_duration_millis(),
        }
    }

    pub fn step_count(&self)              -> StepIndex   { self.step_count }
    pub fn simulated_millis(&self)        -> Millis      { self.accumulator.simulated_millis() }
    pub fn observed_elapsed_millis(&self) -> Millis      { self.accumulator.observed_millis() }
    pub fn next_turn_threshold(&self)     -> TurnIndex   { self.turns.next_threshold() }
    pub fn is_locked(&self)               -> bool        { self.gate.is_locked() }
    pub fn is_started(&self)              -> bool        { self.baseline.is_some() }
    pub fn time_mode(&self)               -> TimeMode    { self.time_mode }
    pub fn config(&self)                  -> &PumpConfig { &self.config }
    pub fn clock(&self)                   -> &C          { &self.clock }
    pub fn clock_mut(&mut self)           -> &mut C      { &mut self.clock }

    fn require_started(&self) -> PumpResult<i64> {
        self.baseline.ok_or(PumpError::NotStarted)
    }

    /// Read the clock, rejecting any reading below the previous one.
    fn read_clock(&self) -> PumpResult<Millis> {
        let now = self.clock.now_millis()?;
        if let Some(previous) = self.last_reading.get() {
            if now < previous {
                return Err(ClockError::WentBackwards { previous, now }.into());
            }
        }
        self.last_reading.set(Some(now));
        Ok(now)
    }

    fn elapsed_since(&self, baseline: i64) -> PumpResult<Millis> {
        let now = to_signed(self.read_clock()?)?;
        Ok(Millis::try_from(now.saturating_sub(baseline)).unwrap_or(0))
    }
}

fn to_signed(millis: Millis) -> PumpResult<i64> {
    i64::try_from(millis).map_err(|_| PumpError::ElapsedOverflow { millis })
}
