//! Stand-up blend and policy hand-off.
//!
//! `Standing` interpolates from the pose captured on its first tick to the
//! default pose over `stand_duration · loop_frequency` ticks. Once the blend
//! fraction reaches 1.0 the next tick engages `PolicyActive`, which is
//! terminal until [`StandModeController::force_standing`].

use pointfoot_common::control_unit::state::ControllerMode;
use pointfoot_common::types::{JointVec, joint_vec_from};
use tracing::info;

use crate::config::LoadedConfig;

/// Mode with its per-mode data.
#[derive(Debug, Clone, PartialEq)]
pub enum StandState {
    Standing {
        elapsed_ticks: u64,
        /// Captured from the first measured positions seen while standing.
        start_pose: Option<JointVec>,
    },
    PolicyActive,
}

/// What one [`StandModeController::step`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StandStep {
    /// Targets written from the blend at this fraction.
    Blending(f64),
    /// Blend complete; targets set to the default pose, now `PolicyActive`.
    Engaged,
    /// Already `PolicyActive`; targets untouched.
    Active,
}

#[derive(Debug, Clone)]
pub struct StandModeController {
    state: StandState,
    total_ticks: u64,
    default_pose: JointVec,
    /// Number of Standing → PolicyActive transitions.
    engagements: u32,
}

impl StandModeController {
    pub fn new(config: &LoadedConfig) -> Self {
        Self::with_ticks(config.robot.stand_ticks(), config.default_pose.clone())
    }

    pub fn with_ticks(total_ticks: u64, default_pose: JointVec) -> Self {
        Self {
            state: StandState::Standing {
                elapsed_ticks: 0,
                start_pose: None,
            },
            total_ticks,
            default_pose,
            engagements: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> &StandState {
        &self.state
    }

    pub fn mode(&self) -> ControllerMode {
        match self.state {
            StandState::Standing { .. } => ControllerMode::Standing,
            StandState::PolicyActive => ControllerMode::PolicyActive,
        }
    }

    #[inline]
    pub fn engagements(&self) -> u32 {
        self.engagements
    }

    /// Blend length in ticks.
    #[inline]
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Blend fraction in `[0, 1]`. Always 1 once `PolicyActive`.
    pub fn fraction(&self) -> f64 {
        match self.state {
            StandState::Standing { elapsed_ticks, .. } => blend_fraction(elapsed_ticks, self.total_ticks),
            StandState::PolicyActive => 1.0,
        }
    }

    /// Advance one tick.
    ///
    /// While standing, writes the blended pose into `targets`. `measured` is
    /// captured as the start pose on the first standing tick.
    pub fn step(&mut self, measured: &[f64], targets: &mut [f64]) -> StandStep {
        let total = self.total_ticks;
        let StandState::Standing {
            elapsed_ticks,
            start_pose,
        } = &mut self.state
        else {
            return StandStep::Active;
        };

        let f = blend_fraction(*elapsed_ticks, total);
        if f >= 1.0 {
            copy_pose(&self.default_pose, targets);
            self.state = StandState::PolicyActive;
            self.engagements += 1;
            info!("Stand blend complete; policy engaged");
            return StandStep::Engaged;
        }

        let start = start_pose.get_or_insert_with(|| joint_vec_from(measured));
        interpolate(start, &self.default_pose, f, targets);
        *elapsed_ticks += 1;
        StandStep::Blending(f)
    }

    /// Re-enter `Standing` and blend from `measured` (or from the next
    /// measured pose when `None`).
    pub fn force_standing(&mut self, measured: Option<&[f64]>) {
        self.state = StandState::Standing {
            elapsed_ticks: 0,
            start_pose: measured.map(joint_vec_from),
        };
    }
}

/// `min(1, elapsed / total)`, 1 when `total == 0`.
#[inline]
pub fn blend_fraction(elapsed: u64, total: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        (elapsed as f64 / total as f64).min(1.0)
    }
}

/// `(1 − f)·a + f·b`, exact at both ends.
#[inline]
pub fn lerp(a: f64, b: f64, f: f64) -> f64 {
    (1.0 - f) * a + f * b
}

/// Element-wise [`lerp`] into `out`.
pub fn interpolate(start: &[f64], end: &[f64], f: f64, out: &mut [f64]) {
    for ((o, a), b) in out.iter_mut().zip(start).zip(end) {
        *o = lerp(*a, *b, f);
    }
}

fn copy_pose(pose: &[f64], out: &mut [f64]) {
    for (o, p) in out.iter_mut().zip(pose) {
        *o = *p;
    }
}
