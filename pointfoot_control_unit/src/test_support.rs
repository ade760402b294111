//! Shared fixtures for unit tests.

use crate::config::{LoadedConfig, load_config_from_str};

pub const SAMPLE_TOML: &str = include_str!("../config/pointfoot.toml");

/// The bundled sample configuration, validated.
pub fn sample_config() -> LoadedConfig {
    load_config_from_str(SAMPLE_TOML).expect("sample config is valid")
}
