//! Robot I/O adapters.

pub mod robot;
pub mod sim;
