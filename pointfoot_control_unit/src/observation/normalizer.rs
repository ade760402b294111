//! Observation scaling and saturation.
//!
//! Every field class has its own scale (linear velocity, angular velocity,
//! joint position, joint velocity, command axes). Every resulting scalar is
//! clamped to `±clip_observations`. Saturating, never erroring: NaN maps to 0
//! and ±inf to the bound, so the clamp law holds for any input.

use pointfoot_common::consts::COMMAND_AXES;
use pointfoot_common::control_unit::command::Command;
use pointfoot_common::control_unit::config::{ObsScales, PointfootConfig, UserCmdScales};
use pointfoot_common::types::{JointVec, joint_zeros};

/// Raw per-tick inputs to the normalizer.
#[derive(Debug, Clone, Copy)]
pub struct RawSignals<'a> {
    /// Measured joint positions [rad], `JointSet` order.
    pub joint_pos: &'a [f64],
    /// Measured joint velocities [rad/s].
    pub joint_vel: &'a [f64],
    /// Body angular velocity [rad/s] (mounting offset already applied).
    pub ang_vel: [f64; 3],
    /// Base linear velocity [m/s].
    pub lin_vel: [f64; 3],
    /// Gravity direction in the body frame (unit vector).
    pub gravity: [f64; 3],
    pub command: Command,
}

/// Scaled and clamped observation fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedState {
    pub lin_vel: [f64; 3],
    pub ang_vel: [f64; 3],
    pub gravity: [f64; 3],
    /// `(q - q_default) · dof_pos`.
    pub dof_pos: JointVec,
    pub dof_vel: JointVec,
    pub commands: [f64; COMMAND_AXES],
}

impl NormalizedState {
    pub fn zeros(joints: usize) -> Self {
        Self {
            lin_vel: [0.0; 3],
            ang_vel: [0.0; 3],
            gravity: [0.0; 3],
            dof_pos: joint_zeros(joints),
            dof_vel: joint_zeros(joints),
            commands: [0.0; COMMAND_AXES],
        }
    }
}

/// Field-class scaling followed by symmetric saturation.
#[derive(Debug, Clone)]
pub struct Normalizer {
    scales: ObsScales,
    cmd_scales: UserCmdScales,
    clip: f64,
    default_pose: JointVec,
}

impl Normalizer {
    pub fn new(config: &PointfootConfig, default_pose: &JointVec) -> Self {
        Self {
            scales: config.normalization.obs_scales,
            cmd_scales: config.user_cmd_scales,
            clip: config.normalization.clip_scales.clip_observations,
            default_pose: default_pose.clone(),
        }
    }

    /// Saturation bound.
    #[inline]
    pub fn clip(&self) -> f64 {
        self.clip
    }

    /// Clamp one scalar to `±clip_observations`.
    #[inline]
    pub fn saturate(&self, v: f64) -> f64 {
        saturate(v, self.clip)
    }

    /// Scale and clamp all fields of `raw` into `out`.
    ///
    /// Joint slices shorter than the configured joint count leave the
    /// remaining entries at 0.
    pub fn normalize(&self, raw: &RawSignals<'_>, out: &mut NormalizedState) {
        let c = self.clip;
        let s = &self.scales;

        for i in 0..3 {
            out.lin_vel[i] = saturate(raw.lin_vel[i] * s.lin_vel, c);
            out.ang_vel[i] = saturate(raw.ang_vel[i] * s.ang_vel, c);
            out.gravity[i] = saturate(raw.gravity[i], c);
        }

        for (j, p) in out.dof_pos.iter_mut().enumerate() {
            let q = raw.joint_pos.get(j).copied().unwrap_or(0.0);
            let q0 = self.default_pose.get(j).copied().unwrap_or(0.0);
            *p = saturate((q - q0) * s.dof_pos, c);
        }
        for (j, v) in out.dof_vel.iter_mut().enumerate() {
            let dq = raw.joint_vel.get(j).copied().unwrap_or(0.0);
            *v = saturate(dq * s.dof_vel, c);
        }

        let cmd = raw.command.as_array();
        let scales = self.cmd_scales.as_array();
        for i in 0..COMMAND_AXES {
            out.commands[i] = saturate(cmd[i] * scales[i], c);
        }
    }
}

/// Symmetric saturating clamp; NaN → 0.
#[inline]
pub fn saturate(v: f64, bound: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(-bound, bound) }
}
