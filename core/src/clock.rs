//! Clock adapters — the pump's only view of real time.
//!
//! RULE: The pump never reads a platform clock directly.
//! Every elapsed-time observation flows through an ElapsedClock,
//! so a fake clock can replay any frame sequence exactly.

use std::time::{Duration, Instant};
use thiserror::Error;

use crate::types::Millis;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("Clock adapter does not report frame deltas")]
    FrameDeltaUnsupported,

    #[error("Clock went backwards: previous reading {previous}ms, now {now}ms")]
    WentBackwards { previous: Millis, now: Millis },

    #[error("Clock unavailable: {0}")]
    Unavailable(String),
}

pub type ClockResult<T> = Result<T, ClockError>;

/// The contract every time source must fulfill.
pub trait ElapsedClock {
    /// Milliseconds since an arbitrary fixed epoch. Must never decrease.
    fn now_millis(&self) -> ClockResult<Millis>;

    /// Milliseconds since the previous call (or since `reset_frame`).
    /// Only consulted in frame-delta mode.
    fn frame_delta_millis(&mut self) -> ClockResult<Millis> {
        Err(ClockError::FrameDeltaUnsupported)
    }

    /// Restart the frame-delta reference point.
    /// Called when the pump establishes a new baseline.
    fn reset_frame(&mut self) {}
}

impl<C: ElapsedClock + ?Sized> ElapsedClock for Box<C> {
    fn now_millis(&self) -> ClockResult<Millis> {
        (**self).now_millis()
    }

    fn frame_delta_millis(&mut self) -> ClockResult<Millis> {
        (**self).frame_delta_millis()
    }

    fn reset_frame(&mut self) {
        (**self).reset_frame()
    }
}

/// A clock that only moves when told to.
///
/// `advance` moves both the absolute reading and the pending frame delta,
/// so the same clock drives monotonic and frame-delta mode identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualClock {
    now:           Millis,
    pending_delta: Millis,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now: Millis) -> Self {
        Self { now, pending_delta: 0 }
    }

    pub fn advance(&mut self, millis: Millis) {
        self.now += millis;
        self.pending_delta += millis;
    }

    /// Overwrite the absolute reading without touching the pending delta.
    /// Setting a lower value simulates a misbehaving adapter.
    pub fn set_now(&mut self, now: Millis) {
        self.now = now;
    }

    pub fn now(&self) -> Millis {
        self.now
    }
}

impl ElapsedClock for ManualClock {
    fn now_millis(&self) -> ClockResult<Millis> {
        Ok(self.now)
    }

    fn frame_delta_millis(&mut self) -> ClockResult<Millis> {
        Ok(std::mem::take(&mut self.pending_delta))
    }

    fn reset_frame(&mut self) {
        self.pending_delta = 0;
    }
}

/// Wall clock backed by `Instant`.
///
/// Frame deltas are reported in whole milliseconds; the sub-millisecond
/// remainder is carried into the next frame instead of being dropped.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin:     Instant,
    last_frame: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { origin: now, last_frame: now }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ElapsedClock for SystemClock {
    fn now_millis(&self) -> ClockResult<Millis> {
        Millis::try_from(self.origin.elapsed().as_millis())
            .map_err(|_| ClockError::Unavailable("elapsed time exceeds u64 milliseconds".into()))
    }

    fn frame_delta_millis(&mut self) -> ClockResult<Millis> {
        let elapsed = Instant::now().saturating_duration_since(self.last_frame);
        let whole = Millis::try_from(elapsed.as_millis())
            .map_err(|_| ClockError::Unavailable("frame delta exceeds u64 milliseconds".into()))?;
        self.last_frame += Duration::from_millis(whole);
        Ok(whole)
    }

    fn reset_frame(&mut self) {
        self.last_frame = Instant::now();
    }
}
