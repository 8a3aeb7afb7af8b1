//! Sensor channel: configuration, sampling lifecycle, and the sample
//! dispatcher
//!
//! One [`SensorChannel`] owns everything attached to one physical
//! sensor: its bus transport, the product-specific conversion factor,
//! the raw-sample buffer, the SOS filter bank, and the (at most one)
//! homing session. The external command layer maps wire identifiers to
//! a channel handle at configuration time and calls the typed methods
//! here; wire encoding never enters this crate.
//!
//! The dispatcher ([`SensorChannel::update`]) is the per-wake entry
//! point of the cooperative worker: read the status word, bail on a
//! spurious wakeup, read one raw sample, buffer it, route it to the
//! active detector, and emit a flush batch when the buffer fills. Timer
//! scheduling stays outside; the worker is driven through a
//! [`SampleGate`] the timer ISR raises.

use crate::buffer::{SampleBatch, SampleBuffer, BATCH_PAIRS};
use crate::errors::{SensorError, SensorResult};
use crate::filter::{SosFilterBank, COEFFS_PER_SECTION};
use crate::homing::{HomingConfig, HomingSession};
use crate::sample::{status, Sample};
use crate::time::Ticks;
use crate::traits::{SensorBus, TriggerChannel};
use crate::wake::SampleGate;

/// Hardware variants and their reference-clock conversion factors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Product {
    /// Unrecognized but tolerated board; treated like the BTT Eddy
    Unknown = 0,
    /// BTT Eddy (12 MHz reference)
    BttEddy = 1,
    /// Cartographer (24 MHz reference from an on-board timer)
    Cartographer = 2,
    /// Mellow Fly (40 MHz reference)
    MellowFly = 3,
}

impl Product {
    /// Decode the configuration wire value; anything else is fatal
    pub fn from_wire(product: u8) -> SensorResult<Self> {
        match product {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::BttEddy),
            2 => Ok(Self::Cartographer),
            3 => Ok(Self::MellowFly),
            _ => Err(SensorError::UnknownProduct { product }),
        }
    }

    /// Raw-count-to-frequency multiplier: reference clock over 2^28
    pub fn conversion_factor(self) -> f32 {
        let reference_hz = match self {
            Self::Unknown | Self::BttEddy => 12_000_000.0,
            Self::Cartographer => 24_000_000.0,
            Self::MellowFly => 40_000_000.0,
        };
        reference_hz / (1u32 << 28) as f32
    }
}

/// Reply to the finish-session command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishReply {
    /// Tick at which the trigger decision was made
    pub trigger_time: Ticks,
    /// Tick of the tap peak; the physically meaningful contact instant
    pub tap_peak_time: Ticks,
    /// Raw word of the sample that aborted the session, zero if none
    pub last_error: u32,
}

/// One physical sensor instance
///
/// Created once at configuration time and mutated continuously while
/// sampling; the caller holds the handle for the life of the process.
#[derive(Debug)]
pub struct SensorChannel<B, T> {
    bus: B,
    product: Product,
    conversion: f32,
    ready_pin: bool,

    /// Sampling period in ticks; zero means stopped
    rest_ticks: u32,
    last_status: u16,
    last_value: u32,

    buffer: SampleBuffer<BATCH_PAIRS>,
    filter: SosFilterBank,
    session: HomingSession,
    trigger: Option<T>,
}

impl<B, T> SensorChannel<B, T>
where
    B: SensorBus,
    T: TriggerChannel,
{
    /// Configure a channel over its bus transport
    ///
    /// `ready_pin` records whether the board wired the sensor's
    /// data-ready line to a GPIO; the timer glue reads it to decide
    /// whether each tick should raise the gate.
    pub fn new(bus: B, product: Product, ready_pin: bool) -> Self {
        Self {
            bus,
            product,
            conversion: product.conversion_factor(),
            ready_pin,
            rest_ticks: 0,
            last_status: 0,
            last_value: 0,
            buffer: SampleBuffer::new(),
            filter: SosFilterBank::new(),
            session: HomingSession::new(),
            trigger: None,
        }
    }

    /// Configured hardware variant
    pub fn product(&self) -> Product {
        self.product
    }

    /// Whether a data-ready pin is wired for this channel
    pub fn has_ready_pin(&self) -> bool {
        self.ready_pin
    }

    /// Sampling period in ticks, zero while stopped
    pub fn rest_ticks(&self) -> u32 {
        self.rest_ticks
    }

    /// True while periodic sampling is running
    pub fn is_sampling(&self) -> bool {
        self.rest_ticks != 0
    }

    /// True while a homing or tap session is armed
    pub fn session_active(&self) -> bool {
        self.session.is_active()
    }

    /// Start or stop periodic sampling
    ///
    /// A nonzero period resets the buffer bookkeeping for a fresh run;
    /// zero stops sampling and returns whatever partial batch was still
    /// buffered. The caller arms or cancels the periodic timer to match.
    pub fn set_sampling(&mut self, rest_ticks: u32, gate: &SampleGate) -> Option<SampleBatch> {
        gate.clear();
        self.rest_ticks = rest_ticks;

        if rest_ticks == 0 {
            log_debug!("sampling stopped");
            return self.buffer.flush(gate);
        }

        log_debug!("sampling started, period {} ticks", rest_ticks);
        self.buffer.reset();
        gate.take_missed();
        None
    }

    /// Process teardown: stop measurements so the host is not spammed
    /// with stale batches on restart
    pub fn shutdown(&mut self, gate: &SampleGate) {
        gate.clear();
        self.rest_ticks = 0;
    }

    /// Latched status and value, or live register reads while stopped
    pub fn latched_status(&mut self) -> SensorResult<(u16, u32)> {
        if self.rest_ticks == 0 {
            let status_word = self.bus.read_status()?;
            self.last_status = status_word;
            let value = self.bus.read_data()?;
            return Ok((status_word, value));
        }
        Ok((self.last_status, self.last_value))
    }

    /// Load one SOS filter section from its wire payload
    ///
    /// Sections must arrive in order from zero; a zero-length payload
    /// clears the bank. See [`SosFilterBank::load_section_bytes`].
    pub fn load_sos_section_bytes(&mut self, index: u8, bytes: &[u8]) -> SensorResult<()> {
        self.filter.load_section_bytes(index, bytes)
    }

    /// Load one SOS filter section from decoded coefficients
    pub fn load_sos_section(
        &mut self,
        index: u8,
        coeffs: [f32; COEFFS_PER_SECTION],
    ) -> SensorResult<()> {
        self.filter.load_section(index, coeffs)
    }

    /// Number of loaded SOS filter sections
    pub fn sos_sections(&self) -> usize {
        self.filter.num_sections()
    }

    /// Arm a homing or tap session, or disarm
    ///
    /// A zero trigger threshold or a missing trigger channel disarms any
    /// session without notifying. Arming while sampling is stopped, or
    /// while a session is already active, is runtime misuse: it is
    /// reported as an abort notification (plain `other_reason_base`) and
    /// the call still returns `Ok`. Malformed configuration - an
    /// unsupported mode, or tap mode with an empty filter bank - is
    /// fatal.
    pub fn arm(&mut self, trigger: Option<T>, cfg: HomingConfig) -> SensorResult<()> {
        let mut new_trigger = match trigger {
            Some(t) if cfg.trigger_value != 0 => t,
            _ => {
                log_debug!("disarming session");
                self.trigger = None;
                self.session.deactivate();
                return Ok(());
            }
        };

        if self.rest_ticks == 0 {
            log_debug!("arm rejected: sampling not started");
            new_trigger.trigger(cfg.other_reason_base);
            return Ok(());
        }

        if self.session.is_active() {
            // Abort the session that is already running, through its own
            // trigger channel; the new request is dropped
            log_debug!("arm rejected: session already active");
            self.session.deactivate();
            match self.trigger.as_mut() {
                Some(old) => old.trigger(cfg.other_reason_base),
                None => new_trigger.trigger(cfg.other_reason_base),
            }
            self.trigger = None;
            return Ok(());
        }

        self.session.arm(&cfg, !self.filter.is_empty())?;
        self.trigger = Some(new_trigger);
        Ok(())
    }

    /// Clear session state and report what the session accumulated
    pub fn finish(&mut self) -> FinishReply {
        self.trigger = None;
        self.session.deactivate();
        FinishReply {
            trigger_time: self.session.trigger_time(),
            tap_peak_time: self.session.tap_peak_time(),
            last_error: self.session.last_error(),
        }
    }

    /// Worker entry point: service the gate if a sample is pending
    pub fn poll(&mut self, now: Ticks, gate: &SampleGate) -> SensorResult<Option<SampleBatch>> {
        if !gate.is_pending() {
            return Ok(None);
        }
        self.update(now, gate)
    }

    /// Dispatch one sample
    ///
    /// Reads the status word and clears the pending flag; a status
    /// without an unread conversion is a spurious wakeup and not an
    /// error. Otherwise the raw value is cached, buffered, routed to the
    /// active detector, and a full buffer is emitted as one batch.
    pub fn update(&mut self, now: Ticks, gate: &SampleGate) -> SensorResult<Option<SampleBatch>> {
        let status_word = self.bus.read_status()?;
        self.last_status = status_word;
        gate.clear();

        if status_word & status::UNREAD_CONV0 == 0 {
            return Ok(None);
        }

        let raw = self.bus.read_data()?;
        self.last_value = raw;

        if !self.buffer.push(now, raw) {
            // The dispatcher flushes at capacity, so a full buffer here
            // means the flush path was bypassed
            return Err(SensorError::InvariantViolation {
                what: "sample buffer overrun",
            });
        }

        if self.session.is_active() {
            if let Some(trigger) = self.trigger.as_mut() {
                self.session.on_sample(
                    Sample::new(raw),
                    status_word,
                    now,
                    self.conversion,
                    &self.filter,
                    trigger,
                )?;
            }
        }

        if self.buffer.is_full() {
            return Ok(self.buffer.flush(gate));
        }
        Ok(None)
    }
}
