//! Sensor/actuator boundary.
//!
//! Both calls must be non-blocking or time-bounded: they run inside the tick.
//! [`MappedIo`] translates between policy joint order and the order the
//! hardware bus uses.

use heapless::Vec as FixedVec;
use pointfoot_common::consts::MAX_JOINTS;
use pointfoot_common::types::{JointCommand, JointVec, SensorFrame, joint_zeros};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IoError {
    #[error("sensor read failed: {0}")]
    Read(String),

    #[error("command rejected: {0}")]
    Rejected(String),

    #[error("joint count {actual} != expected {expected}")]
    JointCount { expected: usize, actual: usize },
}

/// Robot-side I/O for one tick.
pub trait RobotIo {
    /// Latest sensor frame in this adapter's joint order.
    fn read_sensors(&mut self) -> Result<SensorFrame, IoError>;

    /// Hand one command to the actuators.
    fn write_command(&mut self, command: &JointCommand) -> Result<(), IoError>;
}

impl<R: RobotIo + ?Sized> RobotIo for Box<R> {
    fn read_sensors(&mut self) -> Result<SensorFrame, IoError> {
        (**self).read_sensors()
    }

    fn write_command(&mut self, command: &JointCommand) -> Result<(), IoError> {
        (**self).write_command(command)
    }
}

// ─── Joint Order Mapping ────────────────────────────────────────────

/// Policy joint `j` lives at hardware index `order[j]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointMap {
    order: FixedVec<usize, MAX_JOINTS>,
}

impl JointMap {
    /// Identity over `n` joints.
    pub fn identity(n: usize) -> Self {
        Self {
            order: (0..n.min(MAX_JOINTS)).collect(),
        }
    }

    /// From a validated `hardware.joint_order`; identity when `None`.
    ///
    /// Returns `None` unless `order` is a permutation of `0..n`.
    pub fn new(order: Option<&[usize]>, n: usize) -> Option<Self> {
        let Some(order) = order else {
            return Some(Self::identity(n));
        };
        if order.len() != n || n > MAX_JOINTS {
            return None;
        }
        let mut seen = [false; MAX_JOINTS];
        let mut v = FixedVec::new();
        for &idx in order {
            if idx >= n || seen[idx] {
                return None;
            }
            seen[idx] = true;
            v.push(idx).ok()?;
        }
        Some(Self { order: v })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_identity(&self) -> bool {
        self.order.iter().enumerate().all(|(j, &h)| j == h)
    }

    /// Hardware → policy order. Missing hardware entries read as NaN so the
    /// sensor fault path holds them.
    pub fn to_policy(&self, hw: &[f64]) -> JointVec {
        let mut out = JointVec::new();
        for &h in &self.order {
            let _ = out.push(hw.get(h).copied().unwrap_or(f64::NAN));
        }
        out
    }

    /// Policy → hardware order.
    pub fn to_hardware(&self, policy: &[f64]) -> JointVec {
        let mut out = joint_zeros(self.order.len());
        for (j, &h) in self.order.iter().enumerate() {
            out[h] = policy.get(j).copied().unwrap_or(0.0);
        }
        out
    }
}

/// Wraps a hardware-ordered adapter so the loop sees policy order.
#[derive(Debug)]
pub struct MappedIo<R> {
    inner: R,
    map: JointMap,
    command: JointCommand,
}

impl<R: RobotIo> MappedIo<R> {
    pub fn new(inner: R, map: JointMap) -> Self {
        let n = map.len();
        Self {
            inner,
            map,
            command: JointCommand::disabled(n),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn map(&self) -> &JointMap {
        &self.map
    }
}

impl<R: RobotIo> RobotIo for MappedIo<R> {
    fn read_sensors(&mut self) -> Result<SensorFrame, IoError> {
        let mut frame = self.inner.read_sensors()?;
        frame.joints.position = self.map.to_policy(&frame.joints.position);
        frame.joints.velocity = self.map.to_policy(&frame.joints.velocity);
        frame.joints.torque = self.map.to_policy(&frame.joints.torque);
        Ok(frame)
    }

    fn write_command(&mut self, command: &JointCommand) -> Result<(), IoError> {
        self.command.torque = self.map.to_hardware(&command.torque);
        self.command.target = self.map.to_hardware(&command.target);
        self.command.enable = command.enable;
        self.inner.write_command(&self.command)
    }
}
