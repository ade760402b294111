//! Observation pipeline root.
//!
//! Raw sensors → [`imu::ImuFrontEnd`] → [`normalizer::Normalizer`] →
//! [`assembler::ObservationAssembler`] → [`buffer::ObservationBuffer`].

pub mod assembler;
pub mod buffer;
pub mod gait;
pub mod imu;
pub mod normalizer;
