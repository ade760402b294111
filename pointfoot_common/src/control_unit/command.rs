//! External command types delivered to the control loop at tick boundaries.

use serde::{Deserialize, Serialize};

use crate::consts::COMMAND_AXES;

/// Navigation intent: linear velocity x/y [m/s], yaw rate [rad/s].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Command {
    pub lin_vel_x: f64,
    pub lin_vel_y: f64,
    pub ang_vel_yaw: f64,
}

impl Command {
    #[inline]
    pub const fn as_array(&self) -> [f64; COMMAND_AXES] {
        [self.lin_vel_x, self.lin_vel_y, self.ang_vel_yaw]
    }

    /// Map raw joystick axes to a command.
    ///
    /// Axis 1 drives forward velocity, axis 0 lateral, axis 2 yaw.
    pub fn from_joystick(axes: [f64; 3], axis_scale: f64) -> Self {
        Self {
            lin_vel_x: axes[1] * axis_scale,
            lin_vel_y: axes[0] * axis_scale,
            ang_vel_yaw: axes[2] * axis_scale,
        }
    }

    /// Non-finite components are zeroed.
    pub fn sanitized(self) -> Self {
        let f = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            lin_vel_x: f(self.lin_vel_x),
            lin_vel_y: f(self.lin_vel_y),
            ang_vel_yaw: f(self.ang_vel_yaw),
        }
    }
}

/// Request handed to the control thread. Applied only between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExternalCommand {
    /// Replace the navigation command.
    Velocity(Command),
    /// Raw joystick axes (scaled by `joystick.axis_scale`).
    Joystick { axes: [f64; 3] },
    /// Re-enter Standing from the current pose.
    ForceStand,
    /// Stop the loop after the current tick.
    Stop,
}
