//! Lock gate — a boolean latch over simulation progress.
//!
//! This is not a concurrency primitive: it never blocks a thread,
//! it only turns `tick()` into a no-op while closed.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockGate {
    enabled: bool,
    locked:  bool,
}

impl LockGate {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, locked: false }
    }

    /// Latch the gate at a turn boundary. Returns true if it was open.
    /// A disabled gate never latches.
    pub fn close(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        !std::mem::replace(&mut self.locked, true)
    }

    /// Open the gate. Idempotent; releases do not queue.
    /// Returns true if the gate was closed.
    pub fn release(&mut self) -> bool {
        std::mem::replace(&mut self.locked, false)
    }

    /// True when `tick()` must not advance.
    pub fn is_blocking(&self) -> bool {
        self.enabled && self.locked
    }

    pub fn is_enabled(&self) -> bool { self.enabled }
    pub fn is_locked(&self)  -> bool { self.locked }
}
