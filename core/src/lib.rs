//! Deterministic fixed-timestep pump with turn-boundary gating.
//!
//! The host calls [`FramePump::tick`] once per frame. The pump turns
//! elapsed time into fixed-size steps, announces turn boundaries, and,
//! when the lock gate is enabled, stalls after each boundary until
//! [`FramePump::release`] is called.

pub mod accumulator;
pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod gate;
pub mod pump;
pub mod rng;
pub mod status;
pub mod turn;
pub mod types;

pub use clock::{ClockError, ElapsedClock, ManualClock, SystemClock};
pub use command::HostCommand;
pub use config::{PumpConfig, TimeMode};
pub use error::{PumpError, PumpResult};
pub use event::{EventLog, PumpEvent};
pub use pump::{FramePump, TickReport};
pub use rng::JitterClock;
pub use status::PumpStatus;
