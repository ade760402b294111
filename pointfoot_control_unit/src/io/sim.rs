//! Simulated robot for bring-up and tests.
//!
//! Each joint is a decoupled second-order plant
//! `I · ddq = τ − b · dq`, integrated with semi-implicit Euler at the loop
//! period. The IMU reads upright unless set with
//! [`SimulatedRobot::set_imu`]. Faults can be injected for a number of
//! upcoming calls.

use std::time::Duration;

use pointfoot_common::types::{
    ImuSample, JointCommand, JointState, JointVec, SensorFrame, joint_vec_from, joint_zeros,
};

use super::robot::{IoError, RobotIo};

/// Plant parameters.
#[derive(Debug, Clone, Copy)]
pub struct SimParams {
    /// Reflected joint inertia [kg·m²].
    pub inertia: f64,
    /// Viscous friction [Nm·s/rad].
    pub friction: f64,
    /// Integration step.
    pub dt: Duration,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            inertia: 0.05,
            friction: 0.2,
            dt: Duration::from_millis(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedRobot {
    params: SimParams,
    position: JointVec,
    velocity: JointVec,
    applied: JointVec,
    imu: ImuSample,
    last_command: Option<JointCommand>,
    writes: u64,
    fail_reads: u32,
    corrupt_reads: u32,
    reject_writes: u32,
}

impl SimulatedRobot {
    /// `n` joints at rest at zero.
    pub fn new(n: usize, params: SimParams) -> Self {
        Self {
            params,
            position: joint_zeros(n),
            velocity: joint_zeros(n),
            applied: joint_zeros(n),
            imu: ImuSample::upright(),
            last_command: None,
            writes: 0,
            fail_reads: 0,
            corrupt_reads: 0,
            reject_writes: 0,
        }
    }

    /// Start from `pose` at rest.
    pub fn with_pose(mut self, pose: &[f64]) -> Self {
        self.position = joint_vec_from(pose);
        self.velocity = joint_zeros(pose.len());
        self.applied = joint_zeros(pose.len());
        self
    }

    pub fn set_imu(&mut self, imu: ImuSample) {
        self.imu = imu;
    }

    pub fn position(&self) -> &[f64] {
        &self.position
    }

    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    /// Last command accepted by the plant.
    pub fn last_command(&self) -> Option<&JointCommand> {
        self.last_command.as_ref()
    }

    /// Accepted writes.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// The next `n` reads fail outright.
    pub fn fail_next_reads(&mut self, n: u32) {
        self.fail_reads = n;
    }

    /// The next `n` reads return NaN for joint 0's position.
    pub fn corrupt_next_reads(&mut self, n: u32) {
        self.corrupt_reads = n;
    }

    /// The next `n` writes are rejected.
    pub fn reject_next_writes(&mut self, n: u32) {
        self.reject_writes = n;
    }

    fn integrate(&mut self, torque: &[f64]) {
        let p = &self.params;
        let dt = p.dt.as_secs_f64();
        for (j, (q, dq)) in self.position.iter_mut().zip(self.velocity.iter_mut()).enumerate() {
            let tau = torque.get(j).copied().unwrap_or(0.0);
            let ddq = (tau - p.friction * *dq) / p.inertia;
            *dq += ddq * dt;
            *q += *dq * dt;
        }
    }
}

impl RobotIo for SimulatedRobot {
    fn read_sensors(&mut self) -> Result<SensorFrame, IoError> {
        if self.fail_reads > 0 {
            self.fail_reads -= 1;
            return Err(IoError::Read("injected read failure".into()));
        }
        let mut frame = SensorFrame {
            joints: JointState {
                position: self.position.clone(),
                velocity: self.velocity.clone(),
                torque: self.applied.clone(),
            },
            imu: self.imu,
            base_lin_vel: [0.0; 3],
        };
        if self.corrupt_reads > 0 {
            self.corrupt_reads -= 1;
            if let Some(q) = frame.joints.position.first_mut() {
                *q = f64::NAN;
            }
        }
        Ok(frame)
    }

    fn write_command(&mut self, command: &JointCommand) -> Result<(), IoError> {
        if self.reject_writes > 0 {
            self.reject_writes -= 1;
            return Err(IoError::Rejected("injected actuator rejection".into()));
        }
        if command.torque.len() != self.position.len() {
            return Err(IoError::JointCount {
                expected: self.position.len(),
                actual: command.torque.len(),
            });
        }
        self.applied = if command.enable {
            command.torque.clone()
        } else {
            joint_zeros(self.position.len())
        };
        let applied = self.applied.clone();
        self.integrate(&applied);
        self.last_command = Some(command.clone());
        self.writes += 1;
        Ok(())
    }
}
