//! Controller state enums.
//!
//! `#[repr(u8)]` for compact status reporting.

use serde::{Deserialize, Serialize};

/// Which path produces joint targets.
///
/// Starts in `Standing`; moves once to `PolicyActive` when the stand blend
/// completes. Returning to `Standing` requires an explicit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum ControllerMode {
    /// Timed blend into the default pose.
    #[default]
    Standing = 0,
    /// Policy-driven targets.
    PolicyActive = 1,
}

impl ControllerMode {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Standing),
            1 => Some(Self::PolicyActive),
            _ => None,
        }
    }
}

/// Torque output safety overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum SafetyState {
    /// No active fault.
    #[default]
    Safe = 0,
    /// Recoverable faults this tick (held values, held targets).
    Degraded = 1,
    /// Unrecoverable fault latched: zero torque, actuators disabled.
    Halted = 2,
}

impl SafetyState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Safe),
            1 => Some(Self::Degraded),
            2 => Some(Self::Halted),
            _ => None,
        }
    }

    /// Whether torque may be emitted.
    #[inline]
    pub const fn allows_torque(&self) -> bool {
        !matches!(self, Self::Halted)
    }
}
