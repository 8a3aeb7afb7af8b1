//! Trigger-decision engine for eddy-current probe homing and tapping
//!
//! Turns periodic raw frequency samples from an LDC1612-class
//! eddy-current sensor into a single homing or tap trigger, timestamped
//! to the originating sample rather than to the detection instant.
//!
//! Key constraints:
//! - No heap allocation anywhere in the sample path
//! - Every per-sample operation is bounded; there is no blocking
//! - A session fires at most once and is inactive before any
//!   notification is observable
//!
//! The timer/scheduler, bus transport, command decoding, and the
//! trigger synchronization object are external collaborators; see
//! [`traits`] and [`wake`] for the seams.
//!
//! ```no_run
//! use eddytap_core::{Product, SampleGate, SensorChannel};
//! # use eddytap_core::{SensorBus, SensorResult};
//! # struct Bus;
//! # impl SensorBus for Bus {
//! #     fn read_status(&mut self) -> SensorResult<u16> { Ok(0) }
//! #     fn read_data(&mut self) -> SensorResult<u32> { Ok(0) }
//! # }
//! # struct Trsync;
//! # impl eddytap_core::TriggerChannel for Trsync {
//! #     fn trigger(&mut self, _reason: u8) {}
//! # }
//! static GATE: SampleGate = SampleGate::new();
//!
//! // Timer tick (interrupt context): raise the gate, wake the worker
//! fn on_timer_tick() -> bool {
//!     GATE.tick(true)
//! }
//!
//! // Cooperative worker: service one pending sample
//! fn worker(channel: &mut SensorChannel<Bus, Trsync>, now: u32) {
//!     match channel.poll(now, &GATE) {
//!         Ok(Some(_batch)) => { /* send the flush batch to the host */ }
//!         Ok(None) => {}
//!         Err(_) => { /* fatal: shut the channel down */ }
//!     }
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Macros for optional logging
#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}

pub mod buffer;
pub mod channel;
pub mod errors;
pub mod filter;
pub mod homing;
pub mod sample;
pub mod time;
pub mod traits;
pub mod wake;

// Public API
pub use buffer::{SampleBatch, SampleBuffer, SamplePair, BATCH_PAIRS};
pub use channel::{FinishReply, Product, SensorChannel};
pub use errors::{SensorError, SensorResult};
pub use filter::{SosFilterBank, SosState, MAX_SECTIONS};
pub use homing::{AbortKind, HomingConfig, HomingMode, HomingSession};
pub use sample::{ErrorFlags, Sample};
pub use time::Ticks;
pub use traits::{SensorBus, TriggerChannel};
pub use wake::SampleGate;

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
