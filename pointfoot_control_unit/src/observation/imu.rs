//! IMU front end: projected gravity and body angular velocity.
//!
//! The mounting offset is added to the IMU's roll/pitch/yaw before gravity
//! is projected into the body frame. The gyro is rotated by the offset
//! rotation alone.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use pointfoot_common::control_unit::config::ImuOrientationOffset;
use pointfoot_common::types::ImuSample;

/// Minimum squared quaternion norm accepted.
const QUAT_NORM_SQ_MIN: f64 = 1e-12;

/// Body-frame IMU quantities consumed by the observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyImu {
    /// Gravity direction in the body frame (unit vector).
    pub gravity: [f64; 3],
    /// Angular velocity in the body frame [rad/s].
    pub ang_vel: [f64; 3],
}

impl BodyImu {
    /// Upright, motionless body.
    pub const UPRIGHT: Self = Self {
        gravity: [0.0, 0.0, -1.0],
        ang_vel: [0.0; 3],
    };
}

#[derive(Debug, Clone, Copy)]
pub struct ImuFrontEnd {
    offset: ImuOrientationOffset,
    offset_rot: UnitQuaternion<f64>,
}

impl ImuFrontEnd {
    pub fn new(offset: ImuOrientationOffset) -> Self {
        Self {
            offset,
            offset_rot: UnitQuaternion::from_euler_angles(offset.roll, offset.pitch, offset.yaw),
        }
    }

    /// Convert one sample. `None` if the quaternion is non-finite or zero.
    pub fn process(&self, sample: &ImuSample) -> Option<BodyImu> {
        let [w, x, y, z] = sample.quat;
        let q = Quaternion::new(w, x, y, z);
        if !q.coords.iter().all(|v| v.is_finite()) || q.norm_squared() < QUAT_NORM_SQ_MIN {
            return None;
        }
        let orientation = UnitQuaternion::from_quaternion(q);

        let (roll, pitch, yaw) = orientation.euler_angles();
        let corrected = UnitQuaternion::from_euler_angles(
            roll + self.offset.roll,
            pitch + self.offset.pitch,
            yaw + self.offset.yaw,
        );
        let g = corrected.inverse_transform_vector(&Vector3::new(0.0, 0.0, -1.0));

        let gyro = Vector3::new(sample.gyro[0], sample.gyro[1], sample.gyro[2]);
        let w_body = self.offset_rot.transform_vector(&gyro);

        Some(BodyImu {
            gravity: [g.x, g.y, g.z],
            ang_vel: [w_body.x, w_body.y, w_body.z],
        })
    }
}
