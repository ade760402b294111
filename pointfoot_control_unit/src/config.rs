//! TOML configuration loader with validation.
//!
//! Loads the `[PointfootCfg]` tuning file, runs every bound and cross-field
//! check, and derives the immutable runtime bundle (`LoadedConfig`) that is
//! passed by reference into every component.

use std::path::Path;
use std::time::Duration;

use pointfoot_common::config::{ConfigError, ConfigLoader};
use pointfoot_common::control_unit::config::{PointfootConfig, PointfootFile};
use pointfoot_common::types::{JointSet, JointVec};
use tracing::debug;

// ─── Loaded Config Bundle ───────────────────────────────────────────

/// Complete validated configuration, ready for runtime use.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Raw validated tuning values.
    pub robot: PointfootConfig,
    /// Ordered joint names.
    pub joints: JointSet,
    /// Default joint angles in `joints` order [rad].
    pub default_pose: JointVec,
    /// Tick period.
    pub period: Duration,
}

impl LoadedConfig {
    /// Validate a parsed config and derive runtime values.
    pub fn from_config(robot: PointfootConfig) -> Result<Self, ConfigError> {
        robot.validate()?;
        let joints = robot.joint_set()?;
        let default_pose = robot.default_pose()?;
        let period = robot.period();
        Ok(Self {
            robot,
            joints,
            default_pose,
            period,
        })
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Inference deadline override, if configured.
    pub fn inference_budget(&self) -> Option<Duration> {
        self.robot
            .runtime
            .inference_budget_us
            .map(Duration::from_micros)
    }
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate the tuning file.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let file = PointfootFile::load(path)?;
    let loaded = LoadedConfig::from_config(file.pointfoot)?;
    debug!(
        "Loaded {} joints from {}",
        loaded.joint_count(),
        path.display()
    );
    Ok(loaded)
}

/// Load config from a TOML string (for testing).
pub fn load_config_from_str(toml_text: &str) -> Result<LoadedConfig, ConfigError> {
    let file = PointfootFile::from_toml(toml_text)?;
    LoadedConfig::from_config(file.pointfoot)
}
