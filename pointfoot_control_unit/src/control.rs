//! Joint-space control stages.
//!
//! Policy actions become position targets ([`action`]) which the PD servo
//! ([`pd`]) turns into bounded torques.

pub mod action;
pub mod pd;
