//! Device tick timestamps
//!
//! The sensor pipeline timestamps every sample with the device's 32-bit
//! tick counter. The counter wraps roughly every few minutes at typical
//! clock rates, so orderings must be computed on the wrapping difference
//! rather than with a plain `<`. The safety gate's start-time check and
//! the reported trigger/peak times all use these ticks; converting them
//! to host time is the command layer's job.

/// Timestamp in device timer ticks (wrapping 32-bit counter)
pub type Ticks = u32;

/// Wraparound-aware ordering: is `a` earlier than `b`?
///
/// Valid as long as the two timestamps are within half the counter
/// range of each other, which the sampling cadence guarantees.
#[inline]
pub fn ticks_is_before(a: Ticks, b: Ticks) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}
