//! Control unit shared definitions: configuration, commands, state enums
//! and fault flags.

pub mod command;
pub mod config;
pub mod error;
pub mod state;
