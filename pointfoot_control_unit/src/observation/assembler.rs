//! Per-tick observation vector layout.
//!
//! ```text
//! [lin_vel 3]? ang_vel 3 | gravity 3 | dof_pos n | dof_vel n | last_actions n
//! | commands 3 | [gait_phase 2 | gait_command 3]?
//! ```
//!
//! The order is the contract with the trained policy and must not change.

use pointfoot_common::control_unit::config::ObservationTerms;

use super::gait::GaitClock;
use super::normalizer::{NormalizedState, saturate};
use crate::config::LoadedConfig;

#[derive(Debug, Clone)]
pub struct ObservationAssembler {
    terms: ObservationTerms,
    joints: usize,
    clip: f64,
    gait: GaitClock,
}

impl ObservationAssembler {
    pub fn new(config: &LoadedConfig) -> Self {
        let robot = &config.robot;
        Self {
            terms: robot.observation,
            joints: config.joint_count(),
            clip: robot.normalization.clip_scales.clip_observations,
            gait: GaitClock::new(robot.loop_frequency, robot.gait),
        }
    }

    /// Observation length for the configured terms.
    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len(self.joints)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the observation for `tick` into `out[..len()]`.
    ///
    /// `last_actions` is the previous clipped policy action; it and the gait
    /// terms are saturated like the normalized fields. Returns the number of
    /// values written (0 if `out` is too short).
    pub fn assemble(
        &self,
        state: &NormalizedState,
        last_actions: &[f64],
        tick: u64,
        out: &mut [f64],
    ) -> usize {
        let total = self.len();
        if out.len() < total {
            return 0;
        }
        let n = self.joints;
        let mut w = Writer { out, at: 0 };

        if self.terms.lin_vel {
            w.put(&state.lin_vel);
        }
        w.put(&state.ang_vel);
        w.put(&state.gravity);
        w.put_joints(&state.dof_pos, n);
        w.put_joints(&state.dof_vel, n);
        for j in 0..n {
            let a = last_actions.get(j).copied().unwrap_or(0.0);
            w.push(saturate(a, self.clip));
        }
        w.put(&state.commands);
        if self.terms.gait {
            for v in self.gait.phase_term(tick) {
                w.push(saturate(v, self.clip));
            }
            for v in self.gait.command_term() {
                w.push(saturate(v, self.clip));
            }
        }
        debug_assert_eq!(w.at, total);
        w.at
    }
}

struct Writer<'a> {
    out: &'a mut [f64],
    at: usize,
}

impl Writer<'_> {
    #[inline]
    fn push(&mut self, v: f64) {
        self.out[self.at] = v;
        self.at += 1;
    }

    #[inline]
    fn put(&mut self, values: &[f64]) {
        self.out[self.at..self.at + values.len()].copy_from_slice(values);
        self.at += values.len();
    }

    /// Exactly `n` values, zero-padded.
    fn put_joints(&mut self, values: &[f64], n: usize) {
        for j in 0..n {
            self.push(values.get(j).copied().unwrap_or(0.0));
        }
    }
}
