//! Command processing root.
//!
//! External commands reach the control thread only through the tick-boundary
//! handoff.

pub mod handoff;
