//! Startup and run-level errors.
//!
//! Faults raised inside a tick never surface here: they are folded into the
//! per-tick `ControlFaults` word and handled by the fault monitor. These are
//! the errors that stop the process.

use pointfoot_common::config::ConfigError;
use thiserror::Error;

use crate::cycle::CycleError;
use crate::policy::port::PolicyError;

#[derive(Debug, Error)]
pub enum ControlError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Policy or model could not be built.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("policy produces {actual} actions but {expected} joints are configured")]
    PolicyShape { expected: usize, actual: usize },

    #[error("hardware.joint_order is not a permutation of the configured joints")]
    JointOrder,

    #[error(transparent)]
    Cycle(#[from] CycleError),
}
