//! Raw sample and status words
//!
//! The sensor reports each conversion as one 32-bit word: the high four
//! bits carry per-sample error flags and the low 28 bits carry the
//! resonance-frequency count. A separate 16-bit status register latches
//! chip-level conditions, including the "unread conversion" bit the
//! dispatcher polls and the amplitude errors the error gate inspects.
//!
//! Samples are immutable once read; everything downstream works on
//! copies of the word.

use core::fmt;

/// One raw 32-bit conversion word from the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample(u32);

impl Sample {
    /// Wrap a raw data word
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The full 32-bit word as read from the data registers
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Error flags from the high four bits
    pub const fn error_flags(self) -> ErrorFlags {
        ErrorFlags((self.0 >> 28) as u8)
    }

    /// Resonance-frequency count from the low 28 bits
    pub const fn count(self) -> u32 {
        self.0 & 0x0FFF_FFFF
    }

    /// Convert the count to frequency units via the channel's factor
    pub fn frequency(self, conversion: f32) -> f32 {
        self.count() as f32 * conversion
    }
}

/// Per-sample error flags (high nibble of the data word)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorFlags(u8);

impl ErrorFlags {
    /// Conversion under range
    pub const UNDER_RANGE: Self = Self(0x8);
    /// Conversion over range
    pub const OVER_RANGE: Self = Self(0x4);
    /// Conversion watchdog timeout
    pub const WATCHDOG: Self = Self(0x2);
    /// Sensor amplitude error
    pub const AMPLITUDE: Self = Self(0x1);

    /// No flags set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// True when no error bit is set
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True when all bits of `other` are set
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Raw nibble value
    pub const fn bits(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for ErrorFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Status-register bits latched by the chip
pub mod status {
    /// Channel 0 has an unread conversion
    pub const UNREAD_CONV0: u16 = 0x0008;
    /// Conversion under range
    pub const ERR_UNDER_RANGE: u16 = 0x2000;
    /// Conversion over range
    pub const ERR_OVER_RANGE: u16 = 0x1000;
    /// Conversion watchdog timeout
    pub const ERR_WATCHDOG: u16 = 0x0800;
    /// Sensor amplitude too high
    pub const ERR_AMPLITUDE_HIGH: u16 = 0x0400;
    /// Sensor amplitude too low
    pub const ERR_AMPLITUDE_LOW: u16 = 0x0200;
}
