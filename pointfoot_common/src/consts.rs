//! System-wide constants for the pointfoot workspace.
//!
//! Single source of truth for all numeric limits and defaults.
//! Imported by all crates; no duplication permitted.

use static_assertions::const_assert;

/// Maximum number of joints a `JointSet` may hold (fixed-capacity storage).
pub const MAX_JOINTS: usize = 12;

/// Upper bound on observation terms (lin_vel and both gait terms included).
pub const MAX_OBSERVATION_TERMS: usize = 9;

/// Joint count of the pointfoot biped (abad/hip/knee × left/right).
pub const POINTFOOT_JOINTS: usize = 6;

/// Number of command axes (lin_vel_x, lin_vel_y, ang_vel_yaw).
pub const COMMAND_AXES: usize = 3;

/// Default control loop frequency [Hz].
pub const LOOP_FREQUENCY_DEFAULT: f64 = 500.0;

/// Upper bound accepted for the loop frequency [Hz].
pub const LOOP_FREQUENCY_MAX: f64 = 10_000.0;

/// Default gait frequency [Hz].
pub const GAIT_FREQUENCY_DEFAULT: f64 = 2.0;

/// Default gait phase offset [0, 1].
pub const GAIT_PHASE_OFFSET_DEFAULT: f64 = 0.5;

/// Default gait contact duration [0, 1].
pub const GAIT_CONTACT_DURATION_DEFAULT: f64 = 0.5;

/// Consecutive inference misses tolerated before forcing Standing.
pub const MAX_INFERENCE_MISSES_DEFAULT: u32 = 3;

/// Consecutive sensor faults tolerated before halting torque output.
pub const MAX_SENSOR_FAULTS_DEFAULT: u32 = 10;

/// Consecutive actuator rejections tolerated before halting torque output.
pub const MAX_ACTUATOR_FAULTS_DEFAULT: u32 = 10;

/// Consecutive tick overruns tolerated before halting torque output.
pub const MAX_OVERRUNS_DEFAULT: u32 = 50;

/// Status log interval [ticks] (1 s at 500 Hz).
pub const STATUS_INTERVAL_DEFAULT: u64 = 500;

/// Raw joystick axis → command scale.
pub const JOYSTICK_AXIS_SCALE_DEFAULT: f64 = 0.5;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/pointfoot.toml";

const_assert!(MAX_JOINTS >= POINTFOOT_JOINTS);
const_assert!(COMMAND_AXES == 3);
