//! Joint-space PD servo with a hard torque ceiling.
//!
//! `τ = kp · (target − q) − kd · dq`, clamped to `±torque_limit`. The clamp
//! runs every tick in every mode; upstream clamps are not relied on.

use pointfoot_common::control_unit::config::ControlConfig;

/// PD gains shared by all joints.
#[derive(Debug, Clone, Copy)]
pub struct PdGains {
    /// Stiffness [Nm/rad].
    pub kp: f64,
    /// Damping [Nm·s/rad].
    pub kd: f64,
    /// Symmetric torque bound [Nm].
    pub torque_limit: f64,
}

impl PdGains {
    pub fn from_config(control: &ControlConfig) -> Self {
        Self {
            kp: control.stiffness,
            kd: control.damping,
            torque_limit: control.user_torque_limit,
        }
    }
}

/// One joint's torque. NaN maps to 0; infinities saturate at the limit.
#[inline]
pub fn pd_torque(gains: &PdGains, target: f64, position: f64, velocity: f64) -> f64 {
    let tau = gains.kp * (target - position) - gains.kd * velocity;
    if tau.is_nan() {
        0.0
    } else {
        tau.clamp(-gains.torque_limit, gains.torque_limit)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PdController {
    gains: PdGains,
}

impl PdController {
    pub fn new(gains: PdGains) -> Self {
        Self { gains }
    }

    #[inline]
    pub fn gains(&self) -> &PdGains {
        &self.gains
    }

    /// Fill `torque[j]` for every joint. Slices are zipped; the shortest wins.
    pub fn compute(&self, targets: &[f64], position: &[f64], velocity: &[f64], torque: &mut [f64]) {
        for (((tau, t), q), dq) in torque.iter_mut().zip(targets).zip(position).zip(velocity) {
            *tau = pd_torque(&self.gains, *t, *q, *dq);
        }
    }
}
