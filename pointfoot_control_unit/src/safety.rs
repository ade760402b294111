//! Safety module root.
//!
//! Fault counting, escalation and the latched torque halt.

pub mod monitor;
