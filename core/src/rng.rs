//! Deterministic frame-length generation.
//!
//! RULE: Replayed host loops never consult a platform RNG.
//! A JitterClock is seeded once; the same seed yields the same
//! sequence of frame lengths on every machine, so two pumps fed
//! from equal seeds must emit identical steps and turns.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

use crate::{
    clock::{ClockResult, ElapsedClock},
    types::Millis,
};

/// Seeded RNG stream for simulated host frames.
pub struct FrameRng {
    inner: Pcg64Mcg,
}

impl FrameRng {
    pub fn new(seed: u64) -> Self {
        Self { inner: Pcg64Mcg::seed_from_u64(seed) }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll a u64 in [lo, hi].
    pub fn range_inclusive(&mut self, lo: u64, hi: u64) -> u64 {
        debug_assert!(lo <= hi);
        match (hi - lo).checked_add(1) {
            Some(span) => lo + self.next_u64_below(span),
            None => self.inner.next_u64(),
        }
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// A simulated host frame clock with seeded frame-length jitter.
///
/// Each `next_frame` call advances time by a length drawn from
/// `[min_frame_millis, max_frame_millis]`. Hitches are either injected
/// explicitly with `stall` or rolled per frame via `with_stalls`.
pub struct JitterClock {
    rng:              FrameRng,
    now:              Millis,
    pending_delta:    Millis,
    min_frame_millis: Millis,
    max_frame_millis: Millis,
    stall_chance:     f64,
    stall_millis:     Millis,
}

impl JitterClock {
    pub fn new(seed: u64, min_frame_millis: Millis, max_frame_millis: Millis) -> Self {
        let (lo, hi) = if min_frame_millis <= max_frame_millis {
            (min_frame_millis, max_frame_millis)
        } else {
            (max_frame_millis, min_frame_millis)
        };
        Self {
            rng: FrameRng::new(seed),
            now: 0,
            pending_delta: 0,
            min_frame_millis: lo,
            max_frame_millis: hi,
            stall_chance: 0.0,
            stall_millis: 0,
        }
    }

    /// Each frame additionally stalls for `stall_millis` with probability `chance`.
    pub fn with_stalls(mut self, chance: f64, stall_millis: Millis) -> Self {
        self.stall_chance = chance.clamp(0.0, 1.0);
        self.stall_millis = stall_millis;
        self
    }

    /// Advance by one host frame. Returns the frame length.
    pub fn next_frame(&mut self) -> Millis {
        let mut frame = self
            .rng
            .range_inclusive(self.min_frame_millis, self.max_frame_millis);
        if self.stall_chance > 0.0 && self.rng.chance(self.stall_chance) {
            frame += self.stall_millis;
        }
        self.advance(frame);
        frame
    }

    /// Advance by an explicit amount (a hitch, a debugger pause).
    pub fn stall(&mut self, millis: Millis) {
        self.advance(millis);
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    fn advance(&mut self, millis: Millis) {
        self.now += millis;
        self.pending_delta += millis;
    }
}

impl ElapsedClock for JitterClock {
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
