//! Homing and tap session state machine
//!
//! At most one session runs per channel. A session is armed with its
//! thresholds and reason codes, consumes admitted samples from the
//! dispatcher, and ends itself exactly once: either by notifying the
//! trigger channel with the success reason, or by aborting with
//! `other_reason_base` plus an [`AbortKind`] offset. The mode is forced
//! back to `Inactive` *before* any notification side-effect is
//! observable, so the caller can re-arm immediately after an abort.
//!
//! Two gates guard every sample:
//!
//! - the **error gate** tolerates a configured streak of consecutive
//!   faulty samples, dropping them silently, and aborts the session when
//!   the streak exceeds the limit;
//! - the **safety gate** holds the detectors off until the signal has
//!   passed a start-value threshold after a start-time deadline. For tap
//!   sessions the trigger threshold doubles as a second stage: coarse
//!   approach first, then fine approach, before tap evaluation begins.
//!
//! Homing is a plain raw-threshold comparison. Tap detection converts
//! the raw count to frequency, subtracts the baseline captured during
//! the approach, smooths the result through the SOS cascade, and fires
//! when the signal falls a configured amount below its running peak. The
//! sensor frequency rises on approach and collapses at contact, so
//! peak-then-fall survives noise that a plain threshold would not, and
//! the retained peak timestamp is the physically meaningful contact
//! instant.

use crate::errors::{SensorError, SensorResult};
use crate::filter::{SosFilterBank, SosState};
use crate::sample::{status, Sample};
use crate::time::{ticks_is_before, Ticks};
use crate::traits::TriggerChannel;

/// Session mode as configured by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HomingMode {
    /// No session
    None = 0,
    /// Raw-threshold homing
    Home = 1,
    /// Reserved; arming this mode is a fatal error
    WeightedMovingAverage = 2,
    /// Filtered peak-and-fall tap detection
    Tap = 3,
}

impl HomingMode {
    /// Decode the wire value used by the command layer
    pub fn from_wire(mode: u8) -> SensorResult<Self> {
        match mode {
            0 => Ok(Self::None),
            1 => Ok(Self::Home),
            2 => Ok(Self::WeightedMovingAverage),
            3 => Ok(Self::Tap),
            _ => Err(SensorError::UnsupportedMode { mode }),
        }
    }
}

/// Abort reason offsets added to a session's `other_reason_base`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AbortKind {
    /// Sensor fault streak exceeded the configured tolerance
    SensorError = 0,
    /// Reserved for the host-side probe-too-low check
    ProbeTooLow = 1,
    /// Start-value threshold crossed before the start-time deadline
    TooEarly = 2,
}

/// Parameters for arming a session
#[derive(Debug, Clone, Copy)]
pub struct HomingConfig {
    /// Reason code reported on a successful trigger
    pub success_reason: u8,
    /// Base reason code for aborts; [`AbortKind`] offsets are added
    pub other_reason_base: u8,
    /// Homing trigger threshold, or the tap second-stage threshold (raw
    /// units); zero disarms
    pub trigger_value: u32,
    /// Safety-gate start-value threshold (raw units); zero disables
    pub start_value: u32,
    /// Safety-gate start-time deadline (ticks); zero disables
    pub start_time: Ticks,
    /// Detection mode
    pub mode: HomingMode,
    /// Post-peak drop that counts as a tap, 16.16 fixed point
    pub tap_threshold: i32,
    /// Consecutive faulty samples tolerated before aborting
    pub error_threshold: u8,
}

/// Admission state shared by both detectors
#[derive(Debug, Clone, Copy)]
struct GateState {
    safe_start_value: u32,
    safe_start_time: Ticks,
    trigger_value: u32,
    error_count: u8,
    error_threshold: u8,
    last_error: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorVerdict {
    /// Clean sample, process it
    Admit,
    /// Faulty but tolerated, drop it
    Drop,
    /// Fault streak over the limit, abort the session
    Exceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartVerdict {
    /// Safety thresholds satisfied
    Ready,
    /// Still approaching, keep waiting
    NotReady,
    /// Threshold crossed before the deadline, hard fault
    TooEarly,
}

impl GateState {
    const fn new() -> Self {
        Self {
            safe_start_value: 0,
            safe_start_time: 0,
            trigger_value: 0,
            error_count: 0,
            error_threshold: 0,
            last_error: 0,
        }
    }

    /// Still waiting for the start-value threshold to be crossed
    fn seeking(&self) -> bool {
        self.safe_start_value != 0
    }

    /// Per-sample fault admission
    fn check_error(&mut self, sample: Sample, status_word: u16) -> ErrorVerdict {
        if sample.error_flags().is_empty() {
            self.error_count = 0;
            return ErrorVerdict::Admit;
        }

        // Amplitude-high while still seeking the start threshold just
        // means the probe is far from the target; not a fault
        if self.seeking() && status_word & status::ERR_AMPLITUDE_HIGH != 0 {
            self.error_count = 0;
            return ErrorVerdict::Drop;
        }

        // Saturating keeps a threshold of 255 meaning unlimited
        // tolerance instead of wrapping back into the abort range
        self.error_count = self.error_count.saturating_add(1);
        log_debug!(
            "sample error {:#x} status {:#x} streak {}",
            sample.raw(),
            status_word,
            self.error_count
        );

        if self.error_count <= self.error_threshold {
            return ErrorVerdict::Drop;
        }

        self.last_error = sample.raw();
        ErrorVerdict::Exceeded
    }

    /// Per-sample safety-threshold admission
    ///
    /// Consumes at most one threshold crossing per call: for tap
    /// sessions the first crossing promotes the trigger value into the
    /// start threshold (the fine-approach stage), the second opens the
    /// gate for good.
    fn check_safe_start(&mut self, raw: u32, time: Ticks, is_tap: bool) -> StartVerdict {
        if self.safe_start_value == 0 {
            return StartVerdict::Ready;
        }

        if raw < self.safe_start_value {
            return StartVerdict::NotReady;
        }

        // Crossing the value threshold before the deadline means the
        // move started below it; measurement ordering is broken
        if self.safe_start_time != 0 && ticks_is_before(time, self.safe_start_time) {
            log_debug!("early crossing at {} < {}", time, self.safe_start_time);
            return StartVerdict::TooEarly;
        }

        if is_tap && self.trigger_value != 0 {
            self.safe_start_value = self.trigger_value;
            self.trigger_value = 0;
            return StartVerdict::NotReady;
        }

        // Gate opens once and stays open
        log_trace!("safe start at {}", time);
        self.safe_start_value = 0;
        StartVerdict::Ready
    }
}

/// Tap-only sub-state, alive only while mode is `Tap`
#[derive(Debug, Clone)]
struct TapState {
    /// Post-peak drop that fires the trigger (frequency units)
    threshold: f32,
    /// Baseline subtracted from every reading before filtering
    frequency_offset: f32,
    /// Running peak of the filtered signal
    peak_value: f32,
    /// Previous filtered value, for rise/fall direction
    last_value: f32,
    /// Cascade delay lines
    delay: SosState,
}

#[derive(Debug, Clone)]
enum Mode {
    Inactive,
    Home,
    Tap(TapState),
}

/// One homing or tap session
///
/// The mode plus its tap-only sub-state is a sum type: `Home` cannot
/// observe stale tap state and vice versa.
#[derive(Debug)]
pub struct HomingSession {
    mode: Mode,
    gate: GateState,
    success_reason: u8,
    other_reason_base: u8,
    trigger_time: Ticks,
    tap_peak_time: Ticks,
}

impl HomingSession {
    /// New inactive session
    pub const fn new() -> Self {
        Self {
            mode: Mode::Inactive,
            gate: GateState::new(),
            success_reason: 0,
            other_reason_base: 0,
            trigger_time: 0,
            tap_peak_time: 0,
        }
    }

    /// True while a session is armed and has not fired or aborted
    pub fn is_active(&self) -> bool {
        !matches!(self.mode, Mode::Inactive)
    }

    /// Trigger decision time of the finished session (ticks)
    pub fn trigger_time(&self) -> Ticks {
        self.trigger_time
    }

    /// Peak time of the finished tap; earlier than the decision time and
    /// the physically meaningful contact instant
    pub fn tap_peak_time(&self) -> Ticks {
        self.tap_peak_time
    }

    /// Raw value of the sample that aborted the session, if any
    pub fn last_error(&self) -> u32 {
        self.gate.last_error
    }

    /// Force the session inactive without notifying (finish/disarm)
    pub(crate) fn deactivate(&mut self) {
        self.mode = Mode::Inactive;
    }

    /// Arm a fresh session; all prior state is discarded
    ///
    /// `filter_loaded` reports whether the channel's SOS bank has at
    /// least one section; tap mode refuses to run without one.
    pub(crate) fn arm(&mut self, cfg: &HomingConfig, filter_loaded: bool) -> SensorResult<()> {
        let mode = match cfg.mode {
            HomingMode::Home => Mode::Home,
            HomingMode::Tap => {
                if !filter_loaded {
                    return Err(SensorError::FilterNotLoaded);
                }
                Mode::Tap(TapState {
                    threshold: cfg.tap_threshold as f32 / 65536.0,
                    frequency_offset: 0.0,
                    peak_value: 0.0,
                    last_value: 0.0,
                    delay: SosState::new(),
                })
            }
            HomingMode::None | HomingMode::WeightedMovingAverage => {
                return Err(SensorError::UnsupportedMode { mode: cfg.mode as u8 });
            }
        };

        self.gate = GateState {
            safe_start_value: cfg.start_value,
            safe_start_time: cfg.start_time,
            trigger_value: cfg.trigger_value,
            error_count: 0,
            error_threshold: cfg.error_threshold,
            last_error: 0,
        };
        self.success_reason = cfg.success_reason;
        self.other_reason_base = cfg.other_reason_base;
        self.trigger_time = 0;
        self.tap_peak_time = 0;
        self.mode = mode;
        Ok(())
    }

    /// End the session and deliver a reason code
    ///
    /// The mode goes `Inactive` before the notification so a fired or
    /// aborted session can never process another sample.
    fn notify(&mut self, out: &mut impl TriggerChannel, reason: u8) {
        self.mode = Mode::Inactive;
        out.trigger(reason);
    }

    fn abort(&mut self, out: &mut impl TriggerChannel, kind: AbortKind) {
        // The base is host-supplied; wrap rather than panic near 255
        let reason = self.other_reason_base.wrapping_add(kind as u8);
        self.notify(out, reason);
    }

    /// Route one admitted dispatcher sample to the active detector
    pub(crate) fn on_sample(
        &mut self,
        sample: Sample,
        status_word: u16,
        time: Ticks,
        conversion: f32,
        bank: &SosFilterBank,
        out: &mut impl TriggerChannel,
    ) -> SensorResult<()> {
        match self.mode {
            Mode::Inactive => Ok(()),
            Mode::Home => {
                self.home_sample(sample, status_word, time, out);
                Ok(())
            }
            Mode::Tap(_) => self.tap_sample(sample, status_word, time, conversion, bank, out),
        }
    }

    /// Raw-threshold homing: trigger on the first admitted sample
    /// strictly above the trigger value
    fn home_sample(
        &mut self,
        sample: Sample,
        status_word: u16,
        time: Ticks,
        out: &mut impl TriggerChannel,
    ) {
        match self.gate.check_error(sample, status_word) {
            ErrorVerdict::Admit => {}
            ErrorVerdict::Drop => return,
            ErrorVerdict::Exceeded => {
                self.abort(out, AbortKind::SensorError);
                return;
            }
        }

        match self.gate.check_safe_start(sample.raw(), time, false) {
            StartVerdict::Ready => {}
            StartVerdict::NotReady => return,
            StartVerdict::TooEarly => {
                self.abort(out, AbortKind::TooEarly);
                return;
            }
        }

        if sample.raw() > self.gate.trigger_value {
            log_debug!("home trigger at {} value {}", time, sample.raw());
            self.trigger_time = time;
            let reason = self.success_reason;
            self.notify(out, reason);
        }
    }

    /// Filtered peak-and-fall tap detection
    fn tap_sample(
        &mut self,
        sample: Sample,
        status_word: u16,
        time: Ticks,
        conversion: f32,
        bank: &SosFilterBank,
        out: &mut impl TriggerChannel,
    ) -> SensorResult<()> {
        match self.gate.check_error(sample, status_word) {
            ErrorVerdict::Admit => {}
            ErrorVerdict::Drop => return Ok(()),
            ErrorVerdict::Exceeded => {
                self.abort(out, AbortKind::SensorError);
                return Ok(());
            }
        }

        let freq = sample.frequency(conversion);

        // Until the first gate stage is crossed, keep re-capturing the
        // baseline so the filter starts from the last pre-approach
        // reading instead of producing a wild initial transient. These
        // samples are not filtered.
        if self.gate.trigger_value != 0 {
            if let Mode::Tap(tap) = &mut self.mode {
                tap.frequency_offset = freq;
            }
            return match self.gate.check_safe_start(sample.raw(), time, true) {
                StartVerdict::NotReady => Ok(()),
                StartVerdict::TooEarly => {
                    self.abort(out, AbortKind::TooEarly);
                    Ok(())
                }
                // With the second threshold still armed the gate cannot
                // report ready; if it does, session state is corrupt
                StartVerdict::Ready => Err(SensorError::InvariantViolation {
                    what: "safety gate open during tap baseline capture",
                }),
            };
        }

        // Feed the filter even while the second gate stage is closed so
        // its transient settles before values start to matter
        let value = match &mut self.mode {
            Mode::Tap(tap) => bank.run(freq - tap.frequency_offset, &mut tap.delay),
            _ => return Ok(()),
        };

        match self.gate.check_safe_start(sample.raw(), time, true) {
            StartVerdict::Ready => {}
            StartVerdict::NotReady => return Ok(()),
            StartVerdict::TooEarly => {
                self.abort(out, AbortKind::TooEarly);
                return Ok(());
            }
        }

        // Equality intentionally updates neither side: a flat signal
        // must not move the peak nor re-arm a trigger
        let mut fired = false;
        if let Mode::Tap(tap) = &mut self.mode {
            if value < tap.last_value {
                let drop = tap.peak_value - value;
                if drop >= tap.threshold {
                    fired = true;
                }
            } else if value > tap.last_value {
                // Keep tracking on every rise so peak value and time are
                // correct the moment the fall is recognized
                tap.peak_value = value;
                self.tap_peak_time = time;
            }
            if !fired {
                tap.last_value = value;
            }
        }

        if fired {
            log_debug!("tap trigger at {} peak at {}", time, self.tap_peak_time);
            self.trigger_time = time;
            let reason = self.success_reason;
            self.notify(out, reason);
        }
        Ok(())
    }
}

impl Default for HomingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SosFilterBank;

    /// Records every delivered reason code
    struct MockTrigger {
        reasons: Vec<u8>,
    }

    impl MockTrigger {
        fn new() -> Self {
            Self { reasons: Vec::new() }
        }
    }

    impl TriggerChannel for MockTrigger {
        fn trigger(&mut self, reason: u8) {
            self.reasons.push(reason);
        }
    }

    const SUCCESS: u8 = 10;
    const OTHER_BASE: u8 = 20;

    fn home_config(trigger: u32, start_value: u32, start_time: Ticks) -> HomingConfig {
        HomingConfig {
            success_reason: SUCCESS,
            other_reason_base: OTHER_BASE,
            trigger_value: trigger,
            start_value,
            start_time,
            mode: HomingMode::Home,
            tap_threshold: 0,
            error_threshold: 3,
        }
    }

    fn tap_config(trigger: u32, start_value: u32, tap_threshold: f32) -> HomingConfig {
        HomingConfig {
            success_reason: SUCCESS,
            other_reason_base: OTHER_BASE,
            trigger_value: trigger,
            start_value,
            start_time: 0,
            mode: HomingMode::Tap,
            tap_threshold: (tap_threshold * 65536.0) as i32,
            error_threshold: 3,
        }
    }

    fn passthrough_bank() -> SosFilterBank {
        let mut bank = SosFilterBank::new();
        bank.load_section(0, [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        bank
    }

    fn feed(
        session: &mut HomingSession,
        raw: u32,
        time: Ticks,
        bank: &SosFilterBank,
        out: &mut MockTrigger,
    ) {
        session
            .on_sample(Sample::new(raw), 0, time, 1.0, bank, out)
            .unwrap();
    }

    #[test]
    fn homing_triggers_on_first_sample_above_threshold() {
        let mut session = HomingSession::new();
        session.arm(&home_config(5000, 0, 0), false).unwrap();
        let bank = SosFilterBank::new();
        let mut out = MockTrigger::new();

        feed(&mut session, 4999, 100, &bank, &mut out);
        assert!(out.reasons.is_empty());
        assert!(session.is_active());

        feed(&mut session, 5001, 200, &bank, &mut out);
        assert_eq!(out.reasons, vec![SUCCESS]);
        assert_eq!(session.trigger_time(), 200);
        assert!(!session.is_active());
    }

    #[test]
    fn inactive_session_ignores_samples() {
        let mut session = HomingSession::new();
        let bank = SosFilterBank::new();
        let mut out = MockTrigger::new();

        feed(&mut session, u32::MAX & 0x0FFF_FFFF, 1, &bank, &mut out);
        assert!(out.reasons.is_empty());
    }

    #[test]
    fn clean_sample_resets_error_streak() {
        let mut session = HomingSession::new();
        session.arm(&home_config(u32::MAX, 0, 0), false).unwrap();
        let bank = SosFilterBank::new();
        let mut out = MockTrigger::new();

        // Two faults, then a clean sample, then two more faults: the
        // streak never exceeds the threshold of 3
        for t in 0..2 {
            feed(&mut session, 0x8000_0000, t, &bank, &mut out);
        }
        feed(&mut session, 100, 2, &bank, &mut out);
        for t in 3..5 {
            feed(&mut session, 0x8000_0000, t, &bank, &mut out);
        }
        assert!(out.reasons.is_empty());
        assert!(session.is_active());
    }

    #[test]
    fn fault_streak_aborts_exactly_once() {
        let mut session = HomingSession::new();
        session.arm(&home_config(u32::MAX, 0, 0), false).unwrap();
        let bank = SosFilterBank::new();
        let mut out = MockTrigger::new();

        // threshold is 3: the fourth consecutive fault aborts
        for t in 0..4 {
            feed(&mut session, 0x4000_0000 | 7, t, &bank, &mut out);
        }
        assert_eq!(out.reasons, vec![OTHER_BASE + AbortKind::SensorError as u8]);
        assert!(!session.is_active());
        assert_eq!(session.last_error(), 0x4000_0000 | 7);

        // Nothing is processed after the abort
        for t in 4..10 {
            feed(&mut session, 0x4000_0000, t, &bank, &mut out);
        }
        assert_eq!(out.reasons.len(), 1);
    }

    #[test]
    fn max_error_threshold_means_unlimited_tolerance() {
        let mut session = HomingSession::new();
        let mut cfg = home_config(u32::MAX, 0, 0);
        cfg.error_threshold = u8::MAX;
        session.arm(&cfg, false).unwrap();
        let bank = SosFilterBank::new();
        let mut out = MockTrigger::new();

        // More faults than the 8-bit streak counter can represent: the
        // count saturates and the session never aborts
        for t in 0..300 {
            feed(&mut session, 0x2000_0000, t, &bank, &mut out);
        }
        assert!(out.reasons.is_empty());
        assert!(session.is_active());
    }

    #[test]
    fn abort_reason_wraps_at_high_base() {
        let mut session = HomingSession::new();
        let mut cfg = home_config(u32::MAX, 1000, 500);
        cfg.other_reason_base = 255;
        session.arm(&cfg, false).unwrap();
        let bank = SosFilterBank::new();
        let mut out = MockTrigger::new();

        // Early crossing: the too-early offset of 2 wraps the 8-bit
        // reason code instead of panicking
        feed(&mut session, 1500, 100, &bank, &mut out);
        assert_eq!(out.reasons, vec![1]);
        assert!(!session.is_active());
    }

    #[test]
    fn amplitude_high_benign_while_seeking() {
        let mut session = HomingSession::new();
        session.arm(&home_config(u32::MAX, 1000, 0), false).unwrap();
        let bank = SosFilterBank::new();
        let mut out = MockTrigger::new();

        // Far from the plate: amplitude errors are expected, never
        // counted, regardless of how many arrive
        for t in 0..20 {
            session
                .on_sample(
                    Sample::new(0x1000_0000),
                    status::ERR_AMPLITUDE_HIGH,
                    t,
                    1.0,
                    &bank,
                    &mut out,
                )
                .unwrap();
        }
        assert!(out.reasons.is_empty());
        assert!(session.is_active());
    }

    #[test]
    fn too_early_crossing_is_a_hard_abort() {
        let mut session = HomingSession::new();
        session.arm(&home_config(u32::MAX, 1000, 500), false).unwrap();
        let bank = SosFilterBank::new();
        let mut out = MockTrigger::new();

        // Below the value threshold: fine
        feed(&mut session, 500, 100, &bank, &mut out);
        assert!(out.reasons.is_empty());

        // Crossed before the deadline: abort, not a retry
        feed(&mut session, 1500, 200, &bank, &mut out);
        assert_eq!(out.reasons, vec![OTHER_BASE + AbortKind::TooEarly as u8]);
        assert!(!session.is_active());
    }

    #[test]
    fn homing_waits_for_safe_start() {
        let mut session = HomingSession::new();
        session.arm(&home_config(5000, 6000, 0), false).unwrap();
        let bank = SosFilterBank::new();
        let mut out = MockTrigger::new();

        // Above the trigger value but below the safety threshold: the
        // gate holds the detector off
        feed(&mut session, 5500, 100, &bank, &mut out);
        assert!(out.reasons.is_empty());

        // Crossing the safety threshold opens the gate; the same sample
        // is already above the trigger value
        feed(&mut session, 6500, 200, &bank, &mut out);
        assert_eq!(out.reasons, vec![SUCCESS]);
        assert_eq!(session.trigger_time(), 200);
    }

    #[test]
    fn tap_two_stage_gate_then_peak_fall() {
        let mut session = HomingSession::new();
        let bank = passthrough_bank();
        let mut out = MockTrigger::new();
        // Coarse stage at 10_000, fine stage at 20_000, drop of 4.0 fires
        session.arm(&tap_config(20_000, 10_000, 4.0), true).unwrap();

        // Approach: baseline keeps updating, nothing is filtered
        feed(&mut session, 8_000, 10, &bank, &mut out);
        // Crosses the coarse stage: promotes the fine stage, captures
        // the final baseline of 10_000
        feed(&mut session, 10_000, 20, &bank, &mut out);
        // Below the fine stage: filtered for settling, not evaluated
        feed(&mut session, 15_000, 30, &bank, &mut out);
        assert!(out.reasons.is_empty());

        // Gate opens; rising samples track the peak
        feed(&mut session, 20_010, 40, &bank, &mut out);
        feed(&mut session, 20_020, 50, &bank, &mut out);
        feed(&mut session, 20_030, 60, &bank, &mut out);
        assert!(out.reasons.is_empty());

        // Falls by 5.0 >= 4.0: tap. Decision time is now, contact time
        // is the peak's
        feed(&mut session, 20_025, 70, &bank, &mut out);
        assert_eq!(out.reasons, vec![SUCCESS]);
        assert_eq!(session.trigger_time(), 70);
        assert_eq!(session.tap_peak_time(), 60);
        assert!(!session.is_active());
    }

    #[test]
    fn tap_small_dip_does_not_fire() {
        let mut session = HomingSession::new();
        let bank = passthrough_bank();
        let mut out = MockTrigger::new();
        session.arm(&tap_config(20_000, 10_000, 4.0), true).unwrap();

        feed(&mut session, 10_000, 10, &bank, &mut out);
        feed(&mut session, 20_010, 20, &bank, &mut out);
        feed(&mut session, 20_030, 30, &bank, &mut out);
        // Dip of 2.0 < 4.0: no trigger, session stays armed
        feed(&mut session, 20_028, 40, &bank, &mut out);
        assert!(out.reasons.is_empty());
        assert!(session.is_active());

        // Recovers past the old peak, then falls far enough
        feed(&mut session, 20_040, 50, &bank, &mut out);
        feed(&mut session, 20_035, 60, &bank, &mut out);
        assert_eq!(out.reasons, vec![SUCCESS]);
        assert_eq!(session.tap_peak_time(), 50);
    }

    #[test]
    fn tap_plateau_hysteresis() {
        let mut session = HomingSession::new();
        let bank = passthrough_bank();
        let mut out = MockTrigger::new();
        session.arm(&tap_config(20_000, 10_000, 4.0), true).unwrap();

        feed(&mut session, 10_000, 10, &bank, &mut out);
        feed(&mut session, 20_030, 20, &bank, &mut out);
        // Flat repeat neither moves the peak time nor triggers
        feed(&mut session, 20_030, 30, &bank, &mut out);
        assert_eq!(session.tap_peak_time(), 20);
        assert!(out.reasons.is_empty());

        // The later fall is measured against the true peak
        feed(&mut session, 20_025, 40, &bank, &mut out);
        assert_eq!(out.reasons, vec![SUCCESS]);
        assert_eq!(session.tap_peak_time(), 20);
    }

    #[test]
    fn tap_without_start_threshold_is_invariant_violation() {
        let mut session = HomingSession::new();
        let bank = passthrough_bank();
        let mut out = MockTrigger::new();
        // start_value of zero means the safety gate reports ready during
        // baseline capture, which the tap path must treat as corrupt
        session.arm(&tap_config(20_000, 0, 4.0), true).unwrap();

        let err = session
            .on_sample(Sample::new(100), 0, 10, 1.0, &bank, &mut out)
            .unwrap_err();
        assert!(matches!(err, SensorError::InvariantViolation { .. }));
    }

    #[test]
    fn arming_tap_needs_filter_sections() {
        let mut session = HomingSession::new();
        assert_eq!(
            session.arm(&tap_config(20_000, 10_000, 4.0), false),
            Err(SensorError::FilterNotLoaded)
        );
        assert!(!session.is_active());
    }

    #[test]
    fn wma_mode_is_rejected() {
        let mut session = HomingSession::new();
        let cfg = HomingConfig {
            mode: HomingMode::WeightedMovingAverage,
            ..home_config(5000, 0, 0)
        };
        assert_eq!(
            session.arm(&cfg, false),
            Err(SensorError::UnsupportedMode { mode: 2 })
        );
    }
}
