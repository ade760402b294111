//! Fault accounting and latched halt.
//!
//! ## Fault Model
//!
//! - **Recoverable** (SENSOR_FAULT, INFERENCE_TIMEOUT, ACTUATOR_FAULT,
//!   TICK_OVERRUN): handled locally by the loop, counted here.
//! - **Escalation** (INFERENCE_ESCALATED): more than the configured number
//!   of consecutive inference misses. The loop forces `Standing`; the
//!   streak restarts.
//! - **Critical** (SENSOR_LOST, ACTUATOR_LOST, OVERRUN_PERSISTENT): more
//!   than the configured number of consecutive faulty ticks. Latches a torque
//!   halt for the rest of the process lifetime.
//!
//! Recurring degraded states are reported at most once per
//! [`WARN_INTERVAL_TICKS`] per fault class.

use std::fmt::Display;
use std::time::Duration;

use pointfoot_common::control_unit::config::RuntimeConfig;
use pointfoot_common::control_unit::error::ControlFaults;
use pointfoot_common::control_unit::state::SafetyState;
use tracing::{error, warn};

/// Minimum ticks between repeated warnings of one fault class.
pub const WARN_INTERVAL_TICKS: u64 = 500;

/// Consecutive-fault thresholds. Exceeding a threshold escalates.
#[derive(Debug, Clone, Copy)]
pub struct FaultLimits {
    pub inference_misses: u32,
    pub sensor_faults: u32,
    pub actuator_faults: u32,
    pub overruns: u32,
}

impl FaultLimits {
    pub fn from_runtime(runtime: &RuntimeConfig) -> Self {
        Self {
            inference_misses: runtime.max_consecutive_inference_misses,
            sensor_faults: runtime.max_consecutive_sensor_faults,
            actuator_faults: runtime.max_consecutive_actuator_faults,
            overruns: runtime.max_consecutive_overruns,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Streak {
    consecutive: u32,
    total: u64,
    last_report: Option<u64>,
}

impl Streak {
    fn hit(&mut self) {
        self.consecutive = self.consecutive.saturating_add(1);
        self.total += 1;
    }

    #[inline]
    fn clear(&mut self) {
        self.consecutive = 0;
    }

    /// Rate limiter: first fault of a streak, then every `WARN_INTERVAL_TICKS`.
    fn should_report(&mut self, tick: u64) -> bool {
        let due = self.consecutive == 1
            || self
                .last_report
                .is_none_or(|t| tick.saturating_sub(t) >= WARN_INTERVAL_TICKS);
        if due {
            self.last_report = Some(tick);
        }
        due
    }
}

/// Lifetime fault totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultTotals {
    pub sensor_faults: u64,
    pub inference_misses: u64,
    pub actuator_faults: u64,
    pub overruns: u64,
    pub escalations: u64,
}

#[derive(Debug, Clone)]
pub struct FaultMonitor {
    limits: FaultLimits,
    sensor: Streak,
    inference: Streak,
    actuator: Streak,
    overrun: Streak,
    escalations: u64,
    /// Critical flags latched so far.
    latched: ControlFaults,
}

impl FaultMonitor {
    pub fn new(limits: FaultLimits) -> Self {
        Self {
            limits,
            sensor: Streak::default(),
            inference: Streak::default(),
            actuator: Streak::default(),
            overrun: Streak::default(),
            escalations: 0,
            latched: ControlFaults::empty(),
        }
    }

    /// True once any critical fault has latched.
    #[inline]
    pub fn is_halted(&self) -> bool {
        self.latched.has_critical()
    }

    /// Latched critical flags.
    #[inline]
    pub fn latched(&self) -> ControlFaults {
        self.latched
    }

    /// Overlay state for a tick that raised `tick_faults`.
    pub fn safety_state(&self, tick_faults: ControlFaults) -> SafetyState {
        if self.is_halted() {
            SafetyState::Halted
        } else if tick_faults.is_empty() {
            SafetyState::Safe
        } else {
            SafetyState::Degraded
        }
    }

    pub fn totals(&self) -> FaultTotals {
        FaultTotals {
            sensor_faults: self.sensor.total,
            inference_misses: self.inference.total,
            actuator_faults: self.actuator.total,
            overruns: self.overrun.total,
            escalations: self.escalations,
        }
    }

    /// Consecutive inference misses in the current streak.
    #[inline]
    pub fn inference_streak(&self) -> u32 {
        self.inference.consecutive
    }

    fn latch(&mut self, flag: ControlFaults, tick: u64, what: &str, count: u32) {
        if !self.latched.contains(flag) {
            error!("tick {tick}: {what} for {count} consecutive ticks; torque output halted");
        }
        self.latched |= flag;
    }

    // ─── Sensors ────────────────────────────────────────────────────

    pub fn sensor_ok(&mut self) {
        self.sensor.clear();
    }

    /// Faulty read: `held` values replaced by their last known value.
    pub fn sensor_fault(&mut self, tick: u64, held: usize, cause: impl Display) -> ControlFaults {
        self.sensor.hit();
        let mut flags = ControlFaults::SENSOR_FAULT;
        if self.sensor.should_report(tick) {
            warn!(
                "tick {tick}: sensor fault ({cause}); holding {held} value(s), streak {}",
                self.sensor.consecutive
            );
        }
        if self.sensor.consecutive > self.limits.sensor_faults {
            self.latch(ControlFaults::SENSOR_LOST, tick, "sensor faults", self.sensor.consecutive);
            flags |= ControlFaults::SENSOR_LOST;
        }
        flags
    }

    // ─── Inference ──────────────────────────────────────────────────

    pub fn inference_ok(&mut self) {
        self.inference.clear();
    }

    /// Missed or failed inference; the previous target is held.
    ///
    /// Sets INFERENCE_ESCALATED (and restarts the streak) when the streak
    /// exceeds the limit.
    pub fn inference_miss(&mut self, tick: u64, cause: impl Display) -> ControlFaults {
        self.inference.hit();
        let mut flags = ControlFaults::INFERENCE_TIMEOUT;
        if self.inference.should_report(tick) {
            warn!(
                "tick {tick}: inference missed ({cause}); holding target, streak {}",
                self.inference.consecutive
            );
        }
        if self.inference.consecutive > self.limits.inference_misses {
            error!(
                "tick {tick}: {} consecutive inference misses; forcing Standing",
                self.inference.consecutive
            );
            self.escalations += 1;
            self.inference.clear();
            flags |= ControlFaults::INFERENCE_ESCALATED;
        }
        flags
    }

    // ─── Actuators ──────────────────────────────────────────────────

    pub fn actuator_ok(&mut self) {
        self.actuator.clear();
    }

    /// Rejected command. Always logged.
    pub fn actuator_fault(&mut self, tick: u64, cause: impl Display) -> ControlFaults {
        self.actuator.hit();
        error!("tick {tick}: actuator rejected command: {cause}");
        let mut flags = ControlFaults::ACTUATOR_FAULT;
        if self.actuator.consecutive > self.limits.actuator_faults {
            self.latch(
                ControlFaults::ACTUATOR_LOST,
                tick,
                "actuator faults",
                self.actuator.consecutive,
            );
            flags |= ControlFaults::ACTUATOR_LOST;
        }
        flags
    }

    // ─── Timing ─────────────────────────────────────────────────────

    pub fn tick_on_time(&mut self) {
        self.overrun.clear();
    }

    pub fn tick_overrun(&mut self, tick: u64, elapsed: Duration, period: Duration) -> ControlFaults {
        self.overrun.hit();
        if self.overrun.should_report(tick) {
            warn!(
                "tick {tick}: overrun {}µs > {}µs (streak {}, total {})",
                elapsed.as_micros(),
                period.as_micros(),
                self.overrun.consecutive,
                self.overrun.total
            );
        }
        let mut flags = ControlFaults::TICK_OVERRUN;
        if self.overrun.consecutive > self.limits.overruns {
            self.latch(
                ControlFaults::OVERRUN_PERSISTENT,
                tick,
                "overruns",
                self.overrun.consecutive,
            );
            flags |= ControlFaults::OVERRUN_PERSISTENT;
        }
        flags
    }
}
