//! Gait phase clock.
//!
//! Phase is a pure function of the tick index so it survives mode changes
//! and never drifts with wall-clock jitter.

use std::f64::consts::TAU;

use pointfoot_common::control_unit::config::GaitConfig;

#[derive(Debug, Clone, Copy)]
pub struct GaitClock {
    loop_frequency: f64,
    gait: GaitConfig,
}

impl GaitClock {
    pub fn new(loop_frequency: f64, gait: GaitConfig) -> Self {
        Self {
            loop_frequency,
            gait,
        }
    }

    /// Phase in `[0, 1)` at `tick`.
    pub fn phase(&self, tick: u64) -> f64 {
        let t = tick as f64 / self.loop_frequency;
        (t * self.gait.frequency).rem_euclid(1.0)
    }

    /// `(sin 2πp, cos 2πp)`.
    pub fn phase_term(&self, tick: u64) -> [f64; 2] {
        let angle = TAU * self.phase(tick);
        [angle.sin(), angle.cos()]
    }

    /// `(frequency, phase_offset, contact_duration)`.
    #[inline]
    pub fn command_term(&self) -> [f64; 3] {
        [
            self.gait.frequency,
            self.gait.phase_offset,
            self.gait.contact_duration,
        ]
    }
}
