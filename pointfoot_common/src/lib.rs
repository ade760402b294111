//! Pointfoot Common Library
//!
//! Shared constants, configuration loading, per-tick data types, controller
//! state enums and fault flags for all pointfoot workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Numeric limits and defaults
//! - [`config`] - Configuration loading trait and error type
//! - [`control_unit`] - Control configuration, commands, state and faults
//! - [`types`] - Sensor frames, joint commands, joint sets
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust,no_run
//! use pointfoot_common::prelude::*;
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let file = PointfootFile::load(Path::new("config/pointfoot.toml"))?;
//!     file.validate()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod consts;
pub mod control_unit;
pub mod prelude;
pub mod types;
