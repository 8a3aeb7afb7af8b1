//! Fatal error types for the trigger engine
//!
//! Two very different failure classes flow through this crate, and only
//! one of them lives here:
//!
//! - **Recoverable session aborts** (sensor fault streak, too-early
//!   safety violation, arming misuse at runtime) are *not* `Err` values.
//!   They are delivered as reason codes through the external trigger
//!   channel, and the session returns to `Inactive` before the
//!   notification is observable. The caller never polls for them.
//!
//! - **Fatal conditions** (malformed configuration or a broken internal
//!   invariant) are returned as [`SensorError`] and propagated with
//!   `?`. They correspond to the firmware's shutdown path: the channel
//!   is no longer trustworthy and the host must intervene.
//!
//! Errors are kept small and `Copy` with `&'static str` payloads only,
//! so they can be returned from the per-sample hot path without heap
//! allocation.

use thiserror_no_std::Error;

/// Result type for channel operations
pub type SensorResult<T> = Result<T, SensorError>;

/// Fatal, shutdown-class errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Hardware variant not known to this firmware
    #[error("unknown product variant {product}")]
    UnknownProduct {
        /// Wire value of the requested variant
        product: u8,
    },

    /// Filter section payload is not exactly six coefficients
    #[error("sos section has {len} bytes, expected 24")]
    BadSectionLength {
        /// Byte length actually supplied
        len: usize,
    },

    /// Filter sections must be loaded sequentially from zero
    #[error("sos section {index} loaded out of order, expected {expected}")]
    SectionOutOfOrder {
        /// Section index supplied
        index: u8,
        /// Next index the bank would accept
        expected: u8,
    },

    /// Homing mode not implemented (weighted moving average is reserved)
    #[error("unsupported homing mode {mode}")]
    UnsupportedMode {
        /// Wire value of the requested mode
        mode: u8,
    },

    /// Tap session armed without any loaded filter sections
    #[error("tap mode armed with empty sos filter bank")]
    FilterNotLoaded,

    /// An internal invariant did not hold; the channel state is suspect
    #[error("invariant violated: {what}")]
    InvariantViolation {
        /// Which invariant broke
        what: &'static str,
    },

    /// Bus transfer to the sensor failed
    #[error("sensor bus fault: {reason}")]
    Bus {
        /// Transport-level failure description
        reason: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::UnknownProduct { product } =>
                defmt::write!(fmt, "unknown product {}", product),
            Self::BadSectionLength { len } =>
                defmt::write!(fmt, "sos section length {} != 24", len),
            Self::SectionOutOfOrder { index, expected } =>
                defmt::write!(fmt, "sos section {} out of order (expected {})", index, expected),
            Self::UnsupportedMode { mode } =>
                defmt::write!(fmt, "unsupported mode {}", mode),
            Self::FilterNotLoaded =>
                defmt::write!(fmt, "empty sos filter bank"),
            Self::InvariantViolation { what } =>
                defmt::write!(fmt, "invariant violated: {}", what),
            Self::Bus { reason } =>
                defmt::write!(fmt, "bus fault: {}", reason),
        }
    }
}
