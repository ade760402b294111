//! Policy action → joint position target.
//!
//! `target = clamp(a, ±clip_actions) · action_scale_pos + q_default`.
//! With `torque_feasible_actions` (the default) the clipped action is
//! further limited to the band whose PD torque stays within the torque limit
//! at the measured state.

use pointfoot_common::types::JointVec;

use super::pd::PdGains;
use crate::config::LoadedConfig;

#[derive(Debug, Clone)]
pub struct ActionPostprocessor {
    clip: f64,
    scale: f64,
    default_pose: JointVec,
    gains: PdGains,
    torque_feasible: bool,
}

impl ActionPostprocessor {
    pub fn new(config: &LoadedConfig) -> Self {
        let control = &config.robot.control;
        Self {
            clip: config.robot.normalization.clip_scales.clip_actions,
            scale: control.action_scale_pos,
            default_pose: config.default_pose.clone(),
            gains: PdGains::from_config(control),
            torque_feasible: control.torque_feasible_actions,
        }
    }

    /// Clip `actions` in place and write the joint targets.
    ///
    /// The clipped values are what the policy sees as `last_actions` on the
    /// next observation. NaN actions become 0.
    pub fn apply(
        &self,
        actions: &mut [f64],
        position: &[f64],
        velocity: &[f64],
        targets: &mut [f64],
    ) {
        for (j, (a, target)) in actions.iter_mut().zip(targets.iter_mut()).enumerate() {
            let mut v = if a.is_nan() { 0.0 } else { a.clamp(-self.clip, self.clip) };
            if self.torque_feasible {
                let q = position.get(j).copied().unwrap_or(0.0);
                let dq = velocity.get(j).copied().unwrap_or(0.0);
                if let Some((lo, hi)) = self.feasible_band(j, q, dq) {
                    v = v.clamp(lo, hi);
                }
            }
            *a = v;
            *target = v * self.scale + self.default_pose.get(j).copied().unwrap_or(0.0);
        }
    }

    /// Action interval keeping `|kp (target − q) − kd dq| ≤ τmax`.
    ///
    /// `None` when `kp` is zero or the band is not finite.
    pub fn feasible_band(&self, joint: usize, q: f64, dq: f64) -> Option<(f64, f64)> {
        let g = &self.gains;
        if g.kp == 0.0 {
            return None;
        }
        let q0 = self.default_pose.get(joint).copied().unwrap_or(0.0);
        let a = (q - q0 + (g.kd * dq - g.torque_limit) / g.kp) / self.scale;
        let b = (q - q0 + (g.kd * dq + g.torque_limit) / g.kp) / self.scale;
        if !(a.is_finite() && b.is_finite()) {
            return None;
        }
        Some((a.min(b), a.max(b)))
    }
}
