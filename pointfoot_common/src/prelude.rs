//! Prelude module for common re-exports.
//!
//! ```rust
//! use pointfoot_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel};
pub use crate::control_unit::config::{PointfootConfig, PointfootFile};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{COMMAND_AXES, MAX_JOINTS};

// ─── Control State ──────────────────────────────────────────────────
pub use crate::control_unit::command::{Command, ExternalCommand};
pub use crate::control_unit::error::ControlFaults;
pub use crate::control_unit::state::{ControllerMode, SafetyState};

// ─── Per-Tick Data ──────────────────────────────────────────────────
pub use crate::types::{
    ImuSample, JointCommand, JointSet, JointState, JointVec, SensorFrame, joint_zeros,
};
