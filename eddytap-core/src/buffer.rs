//! Bounded raw-sample buffer and flush batches
//!
//! Every sample the dispatcher reads is appended here as a
//! (timestamp, raw value) pair, whether or not a session is active. The
//! host uses the stream for height-map capture and diagnostics. Capacity
//! is fixed by what one transport frame can carry, so a full buffer is
//! emitted as exactly one flush batch; a partial buffer is flushed when
//! sampling stops.
//!
//! Each batch carries a wrapping sequence number and the missed-tick
//! count accumulated since the previous flush, so the receiving side can
//! detect lost notifications. The data itself is never silently dropped;
//! only the missed count saturates.

use heapless::Vec;

use crate::time::Ticks;
use crate::wake::SampleGate;

/// Pairs per flush batch: what fits in a 64-byte transport frame after
/// the header, channel id, sequence, and overflow fields
pub const BATCH_PAIRS: usize = 6;

/// One buffered sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePair {
    /// Device tick at which the sample was read
    pub time: Ticks,
    /// Raw 32-bit data word
    pub value: u32,
}

/// One emitted flush event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBatch<const N: usize = BATCH_PAIRS> {
    /// Wrapping per-start sequence number
    pub sequence: u8,
    /// Timer ticks that found a sample still pending since the last
    /// flush (saturating)
    pub overflows: u8,
    /// Buffered (timestamp, value) pairs, oldest first
    pub pairs: Vec<SamplePair, N>,
}

/// Fixed-capacity accumulation buffer
///
/// Unlike a ring buffer this never overwrites: the dispatcher flushes at
/// capacity before the next append can happen, so `push` to a full
/// buffer indicates a dispatcher bug and is reported by the return
/// value.
#[derive(Debug)]
pub struct SampleBuffer<const N: usize = BATCH_PAIRS> {
    pairs: Vec<SamplePair, N>,
    sequence: u8,
}

impl<const N: usize> SampleBuffer<N> {
    /// New empty buffer at sequence zero
    pub const fn new() -> Self {
        Self {
            pairs: Vec::new(),
            sequence: 0,
        }
    }

    /// Drop buffered pairs and restart the sequence (sampling start)
    pub fn reset(&mut self) {
        self.pairs.clear();
        self.sequence = 0;
    }

    /// Append one sample; returns false if the buffer was already full
    pub fn push(&mut self, time: Ticks, value: u32) -> bool {
        self.pairs.push(SamplePair { time, value }).is_ok()
    }

    /// Number of buffered pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// True when the next flush is due
    pub fn is_full(&self) -> bool {
        self.pairs.is_full()
    }

    /// Sequence number the next flush will carry
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Emit the buffered pairs as one batch
    ///
    /// Returns `None` when nothing is buffered (no empty batches on the
    /// wire). On emission the buffer clears, the sequence number
    /// advances, and the gate's missed-tick count is consumed into the
    /// batch.
    pub fn flush(&mut self, gate: &SampleGate) -> Option<SampleBatch<N>> {
        if self.pairs.is_empty() {
            return None;
        }

        let batch = SampleBatch {
            sequence: self.sequence,
            overflows: gate.take_missed(),
            pairs: core::mem::take(&mut self.pairs),
        };
        self.sequence = self.sequence.wrapping_add(1);
        Some(batch)
    }
}

impl<const N: usize> Default for SampleBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_does_not_flush() {
        let gate = SampleGate::new();
        let mut buf: SampleBuffer<4> = SampleBuffer::new();
        assert!(buf.flush(&gate).is_none());
    }

    #[test]
    fn fill_flush_and_sequence() {
        let gate = SampleGate::new();
        let mut buf: SampleBuffer<4> = SampleBuffer::new();

        for i in 0..4u32 {
            assert!(!buf.is_full());
            assert!(buf.push(i * 10, i));
        }
        assert!(buf.is_full());

        let batch = buf.flush(&gate).unwrap();
        assert_eq!(batch.sequence, 0);
        assert_eq!(batch.pairs.len(), 4);
        assert_eq!(batch.pairs[0], SamplePair { time: 0, value: 0 });
        assert_eq!(batch.pairs[3], SamplePair { time: 30, value: 3 });

        // Fifth sample starts a fresh buffer under the next sequence
        assert!(buf.is_empty());
        assert!(buf.push(40, 4));
        let batch = buf.flush(&gate).unwrap();
        assert_eq!(batch.sequence, 1);
        assert_eq!(batch.pairs.len(), 1);
    }

    #[test]
    fn flush_consumes_missed_ticks() {
        let gate = SampleGate::new();
        gate.tick(true);
        gate.tick(true); // one miss

        let mut buf: SampleBuffer<4> = SampleBuffer::new();
        buf.push(1, 1);
        let batch = buf.flush(&gate).unwrap();
        assert_eq!(batch.overflows, 1);

        // Counter was consumed by the flush
        buf.push(2, 2);
        assert_eq!(buf.flush(&gate).unwrap().overflows, 0);
    }

    #[test]
    fn push_to_full_buffer_reports_failure() {
        let mut buf: SampleBuffer<2> = SampleBuffer::new();
        assert!(buf.push(0, 0));
        assert!(buf.push(1, 1));
        assert!(!buf.push(2, 2));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn reset_restarts_sequence() {
        let gate = SampleGate::new();
        let mut buf: SampleBuffer<2> = SampleBuffer::new();
        buf.push(0, 0);
        buf.flush(&gate);
        assert_eq!(buf.sequence(), 1);

        buf.reset();
        assert_eq!(buf.sequence(), 0);
        assert!(buf.is_empty());
    }
}
