//! # Pointfoot Control Unit Library
//!
//! Fixed-frequency joint control for a six-joint pointfoot biped. Every tick
//! reads the robot's sensors, folds them into a normalized observation
//! history, and produces one torque command per joint. Commands come either
//! from a standing blend toward the default pose or from a learned policy
//! evaluated at a decimated rate and tracked by a PD servo.
//!
//! ## Tick Pipeline
//!
//! 1. **Handoff**: external commands applied at the tick boundary
//! 2. **Sensors**: read, hold non-finite values, IMU front-end
//! 3. **Observation**: normalize, assemble, push into the history ring
//! 4. **Mode**: stand blend, or deadline-checked inference every
//!    `decimation` ticks
//! 5. **Servo**: PD torque with the hard torque clamp
//! 6. **Output**: write the joint command
//!
//! ## Zero-Allocation Tick
//!
//! All runtime buffers are sized when the loop is built. The tick performs
//! no heap allocation.

pub mod command;
pub mod config;
pub mod control;
pub mod cycle;
pub mod error;
pub mod io;
pub mod observation;
pub mod policy;
pub mod safety;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
