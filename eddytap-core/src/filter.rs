//! Cascaded second-order-section (biquad) filter bank
//!
//! Tap detection drives the offset-corrected frequency signal through a
//! cascade of up to four biquad sections in direct form II. The cascade
//! is a pure function of one input sample and the per-session delay
//! state: no knowledge of time, triggers, or modes lives here.
//!
//! Coefficients are designed on the host and loaded one section at a
//! time. Each section is six floats `(b0, b1, b2, a0, a1, a2)` with `a0`
//! carried for layout compatibility but never read. Sections must arrive
//! strictly in order from zero; a zero-length load clears the bank.
//!
//! The arithmetic order inside [`SosFilterBank::run`] is deliberate and
//! must not be "simplified": settling behavior depends on section order
//! and rounding, and replaying a stream against fresh state must
//! reproduce outputs bit-for-bit.

use crate::errors::{SensorError, SensorResult};

/// Maximum number of cascaded sections
pub const MAX_SECTIONS: usize = 4;

/// Coefficients per section: b0, b1, b2, a0 (unused), a1, a2
pub const COEFFS_PER_SECTION: usize = 6;

/// Byte length of one section load (six little-endian f32)
pub const SECTION_BYTES: usize = COEFFS_PER_SECTION * 4;

/// Coefficient bank for the cascade
///
/// Shared across sessions of one channel; only meaningful while a tap
/// session is active. Delay state lives separately in [`SosState`] so
/// the bank itself stays immutable during filtering.
#[derive(Debug, Clone)]
pub struct SosFilterBank {
    sections: u8,
    coeffs: [f32; MAX_SECTIONS * COEFFS_PER_SECTION],
}

/// Per-session delay-line state, two floats per section
#[derive(Debug, Clone)]
pub struct SosState {
    w: [f32; MAX_SECTIONS * 2],
}

impl SosState {
    /// Fresh all-zero delay state
    pub const fn new() -> Self {
        Self { w: [0.0; MAX_SECTIONS * 2] }
    }

    /// Zero the delay lines (done at tap session setup)
    pub fn reset(&mut self) {
        self.w = [0.0; MAX_SECTIONS * 2];
    }
}

impl Default for SosState {
    fn default() -> Self {
        Self::new()
    }
}

impl SosFilterBank {
    /// Empty bank; tap arming rejects this state
    pub const fn new() -> Self {
        Self {
            sections: 0,
            coeffs: [0.0; MAX_SECTIONS * COEFFS_PER_SECTION],
        }
    }

    /// Number of loaded sections
    pub fn num_sections(&self) -> usize {
        self.sections as usize
    }

    /// True when no sections have been loaded
    pub fn is_empty(&self) -> bool {
        self.sections == 0
    }

    /// Drop all sections; the next load must be section 0
    pub fn clear(&mut self) {
        self.sections = 0;
    }

    /// Load one section of coefficients
    ///
    /// Sections arrive strictly in order: `index` must equal the number
    /// of sections already loaded. Anything else - a skip, a reload, or
    /// an index past [`MAX_SECTIONS`] - is a configuration error.
    pub fn load_section(&mut self, index: u8, coeffs: [f32; COEFFS_PER_SECTION]) -> SensorResult<()> {
        if index != self.sections || (index as usize) >= MAX_SECTIONS {
            return Err(SensorError::SectionOutOfOrder {
                index,
                expected: self.sections,
            });
        }

        let base = index as usize * COEFFS_PER_SECTION;
        self.coeffs[base..base + COEFFS_PER_SECTION].copy_from_slice(&coeffs);
        self.sections = index + 1;
        Ok(())
    }

    /// Load one section from its 24-byte little-endian wire payload
    ///
    /// A zero-length payload clears the bank; any other length besides
    /// 24 is a fatal protocol error.
    pub fn load_section_bytes(&mut self, index: u8, bytes: &[u8]) -> SensorResult<()> {
        if bytes.is_empty() {
            self.clear();
            return Ok(());
        }
        if bytes.len() != SECTION_BYTES {
            return Err(SensorError::BadSectionLength { len: bytes.len() });
        }

        let mut coeffs = [0.0f32; COEFFS_PER_SECTION];
        for (i, chunk) in bytes.chunks_exact(4).enumerate() {
            // chunks_exact(4) yields exactly 4-byte slices
            coeffs[i] = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        self.load_section(index, coeffs)
    }

    /// Run one sample through the cascade, updating `state` in place
    ///
    /// Direct form II per section:
    /// ```text
    /// w0  = in - a1*w1 - a2*w2
    /// out = b0*w0 + b1*w1 + b2*w2
    /// w1, w2 = w0, w1
    /// ```
    ///
    /// Callers must not run an empty bank as a filtering mode; check
    /// [`SosFilterBank::is_empty`] at session setup. (Structurally an
    /// empty cascade passes the input through unchanged.)
    pub fn run(&self, input: f32, state: &mut SosState) -> f32 {
        let mut value = input;

        for k in 0..self.sections as usize {
            let w1 = state.w[2 * k];
            let w2 = state.w[2 * k + 1];
            let base = k * COEFFS_PER_SECTION;
            let b0 = self.coeffs[base];
            let b1 = self.coeffs[base + 1];
            let b2 = self.coeffs[base + 2];
            // coeffs[base + 3] is a0, unused
            let a1 = self.coeffs[base + 4];
            let a2 = self.coeffs[base + 5];

            let w0 = value - a1 * w1 - a2 * w2;
            value = b0 * w0 + b1 * w1 + b2 * w2;

            state.w[2 * k] = w0;
            state.w[2 * k + 1] = w1;
        }

        value
    }
}

impl Default for SosFilterBank {
    fn default() -> Self {
        Self::new()
    }
}
