//! ISR-to-worker sample handshake
//!
//! The periodic timer fires in interrupt context, where bus transactions
//! are off limits. All the top half may do is note that a conversion
//! should be ready and wake the cooperative worker; the worker then owns
//! every bus read and all session state.
//!
//! Instead of a queue there is a single pending slot: the worker
//! processes at most one sample per wake, and a tick that lands while
//! the previous sample is still pending only bumps a saturating
//! missed-tick counter. No sample is ever double-processed and no
//! backlog can accumulate. The missed count rides along with the next
//! buffer flush so the host can see notification gaps even though no
//! buffered data was lost.
//!
//! Both sides touch only the two atomics below, so the handshake needs
//! no critical section and no unsafe code.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Single-slot pending indicator shared between the timer ISR and the
/// worker
///
/// Safe to place in a `static`; the producer side takes `&self`.
#[derive(Debug)]
pub struct SampleGate {
    /// A conversion is waiting for the worker
    pending: AtomicBool,
    /// Ticks that found the previous sample still pending (saturating)
    missed: AtomicU8,
}

impl SampleGate {
    /// New gate with nothing pending
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            missed: AtomicU8::new(0),
        }
    }

    /// Timer-tick entry point (interrupt context)
    ///
    /// Counts a miss if the previous sample is still pending, then
    /// raises the pending flag when `ready` (the ready pin asserted, or
    /// no ready pin configured). Returns true when the worker should be
    /// woken.
    pub fn tick(&self, ready: bool) -> bool {
        if self.pending.load(Ordering::Relaxed) {
            let missed = self.missed.load(Ordering::Relaxed);
            self.missed.store(missed.saturating_add(1), Ordering::Relaxed);
        }

        if ready {
            self.pending.store(true, Ordering::Release);
        }
        ready
    }

    /// Worker entry point: claim the pending sample, if any
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// True when a sample is waiting
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Drop any pending sample without processing it (stop/shutdown)
    pub fn clear(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// Current missed-tick count
    pub fn missed(&self) -> u8 {
        self.missed.load(Ordering::Relaxed)
    }

    /// Read and reset the missed-tick count (done per buffer flush)
    pub fn take_missed(&self) -> u8 {
        self.missed.swap(0, Ordering::Relaxed)
    }
}

impl Default for SampleGate {
    fn default() -> Self {
        Self::new()
    }
}
