//! Per-tick data exchanged between the control loop and the robot I/O layer.
//!
//! All per-joint arrays are fixed-capacity [`JointVec`]s indexed in
//! [`JointSet`] order. Nothing here allocates after construction.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_JOINTS;

/// Fixed-capacity per-joint array (indexed in `JointSet` order).
pub type JointVec = heapless::Vec<f64, MAX_JOINTS>;

/// Build a `JointVec` of `n` zeros (capped at `MAX_JOINTS`).
pub fn joint_zeros(n: usize) -> JointVec {
    let mut v = JointVec::new();
    for _ in 0..n.min(MAX_JOINTS) {
        let _ = v.push(0.0);
    }
    v
}

/// Build a `JointVec` from a slice (truncated at `MAX_JOINTS`).
pub fn joint_vec_from(values: &[f64]) -> JointVec {
    let mut v = JointVec::new();
    for &x in values.iter().take(MAX_JOINTS) {
        let _ = v.push(x);
    }
    v
}

/// Ordered, immutable set of joint names.
///
/// Order defines vector indexing for every per-joint array in the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointSet {
    names: heapless::Vec<String, MAX_JOINTS>,
}

impl JointSet {
    /// Build from names. Returns `None` if more than `MAX_JOINTS` names are given.
    pub fn new(names: &[String]) -> Option<Self> {
        let mut v = heapless::Vec::new();
        for n in names {
            v.push(n.clone()).ok()?;
        }
        Some(Self { names: v })
    }

    /// Number of joints.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Index of a joint by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Joint name at index.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Measured joint state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointState {
    /// Joint positions [rad].
    pub position: JointVec,
    /// Joint velocities [rad/s].
    pub velocity: JointVec,
    /// Estimated joint torques [Nm].
    pub torque: JointVec,
}

impl JointState {
    pub fn zeros(n: usize) -> Self {
        Self {
            position: joint_zeros(n),
            velocity: joint_zeros(n),
            torque: joint_zeros(n),
        }
    }
}

/// IMU sample as delivered by the robot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImuSample {
    /// Orientation quaternion `[w, x, y, z]`.
    pub quat: [f64; 4],
    /// Angular velocity in the IMU frame [rad/s].
    pub gyro: [f64; 3],
    /// Linear acceleration in the IMU frame [m/s²].
    pub acc: [f64; 3],
}

impl ImuSample {
    /// Upright, motionless IMU.
    pub const fn upright() -> Self {
        Self {
            quat: [1.0, 0.0, 0.0, 0.0],
            gyro: [0.0; 3],
            acc: [0.0, 0.0, 9.81],
        }
    }
}

impl Default for ImuSample {
    fn default() -> Self {
        Self::upright()
    }
}

/// One tick's raw sensor input.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorFrame {
    pub joints: JointState,
    pub imu: ImuSample,
    /// Estimated base linear velocity [m/s] (zero when no estimator is fitted).
    pub base_lin_vel: [f64; 3],
}

impl SensorFrame {
    pub fn zeros(n: usize) -> Self {
        Self {
            joints: JointState::zeros(n),
            imu: ImuSample::upright(),
            base_lin_vel: [0.0; 3],
        }
    }

    /// True when every scalar in the frame is finite and the quaternion is usable.
    pub fn is_valid(&self) -> bool {
        let finite = |s: &[f64]| s.iter().all(|v| v.is_finite());
        finite(&self.joints.position)
            && finite(&self.joints.velocity)
            && finite(&self.joints.torque)
            && finite(&self.imu.gyro)
            && finite(&self.imu.acc)
            && finite(&self.base_lin_vel)
            && quat_usable(&self.imu.quat)
    }

    /// Merge `fresh` into `self`, keeping the previous value for every
    /// non-finite scalar. Returns the number of held (replaced) values.
    ///
    /// Joint arrays of mismatched length count as fully held.
    pub fn merge_finite(&mut self, fresh: &SensorFrame) -> usize {
        let mut held = 0;
        held += merge_slice(&mut self.joints.position, &fresh.joints.position);
        held += merge_slice(&mut self.joints.velocity, &fresh.joints.velocity);
        held += merge_slice(&mut self.joints.torque, &fresh.joints.torque);
        held += merge_slice(&mut self.imu.gyro, &fresh.imu.gyro);
        held += merge_slice(&mut self.imu.acc, &fresh.imu.acc);
        held += merge_slice(&mut self.base_lin_vel, &fresh.base_lin_vel);
        if quat_usable(&fresh.imu.quat) {
            self.imu.quat = fresh.imu.quat;
        } else {
            held += 4;
        }
        held
    }
}

fn merge_slice(held: &mut [f64], fresh: &[f64]) -> usize {
    if held.len() != fresh.len() {
        return held.len().max(1);
    }
    let mut count = 0;
    for (h, f) in held.iter_mut().zip(fresh) {
        if f.is_finite() {
            *h = *f;
        } else {
            count += 1;
        }
    }
    count
}

fn quat_usable(q: &[f64; 4]) -> bool {
    q.iter().all(|v| v.is_finite()) && q.iter().map(|v| v * v).sum::<f64>() > 1e-12
}

/// Per-joint torque command for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct JointCommand {
    /// Torque per joint [Nm].
    pub torque: JointVec,
    /// Joint position targets the torque was computed from [rad].
    pub target: JointVec,
    /// `false` when torque output is halted (actuators must disable).
    pub enable: bool,
}

impl JointCommand {
    /// Disabled zero-torque command.
    pub fn disabled(n: usize) -> Self {
        Self {
            torque: joint_zeros(n),
            target: joint_zeros(n),
            enable: false,
        }
    }

    /// Zero torque and disable, keeping lengths.
    pub fn halt(&mut self) {
        self.torque.iter_mut().for_each(|t| *t = 0.0);
        self.enable = false;
    }
}
