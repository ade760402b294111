//! Configuration structures for the control unit.
//!
//! Mirrors the pointfoot tuning file layout under a `[PointfootCfg]` table.
//! All config types use `serde::Deserialize` for TOML loading. Optional
//! sections use `#[serde(default)]`. Immutable after startup.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use heapless::Vec as FixedVec;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, LogLevel};
use crate::consts::{
    COMMAND_AXES, GAIT_CONTACT_DURATION_DEFAULT, GAIT_FREQUENCY_DEFAULT,
    GAIT_PHASE_OFFSET_DEFAULT, JOYSTICK_AXIS_SCALE_DEFAULT, LOOP_FREQUENCY_MAX,
    MAX_ACTUATOR_FAULTS_DEFAULT, MAX_INFERENCE_MISSES_DEFAULT, MAX_JOINTS, MAX_OBSERVATION_TERMS,
    MAX_OVERRUNS_DEFAULT, MAX_SENSOR_FAULTS_DEFAULT, STATUS_INTERVAL_DEFAULT,
};
use crate::types::{JointSet, JointVec, joint_vec_from};

// ─── Top-Level File ─────────────────────────────────────────────────

/// Root of the tuning file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointfootFile {
    #[serde(rename = "PointfootCfg")]
    pub pointfoot: PointfootConfig,
}

impl PointfootFile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pointfoot.validate()
    }
}

/// Complete control configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointfootConfig {
    /// Control tick rate [Hz].
    pub loop_frequency: f64,
    /// Ordered joint identifiers. Fixes every per-joint array length.
    pub joint_names: Vec<String>,
    pub init_state: InitState,
    pub stand_mode: StandModeConfig,
    pub control: ControlConfig,
    pub normalization: NormalizationConfig,
    pub size: SizeConfig,
    #[serde(default)]
    pub imu_orientation_offset: ImuOrientationOffset,
    pub user_cmd_scales: UserCmdScales,

    /// Observation term selection.
    #[serde(default)]
    pub observation: ObservationTerms,
    /// Gait command fed to the policy.
    #[serde(default)]
    pub gait: GaitConfig,
    /// Fault thresholds and loop housekeeping.
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Hardware bus mapping.
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub joystick: JoystickConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitState {
    /// Nominal position per joint name [rad].
    pub default_joint_angle: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StandModeConfig {
    /// Seconds to blend from the activation pose into the default pose.
    pub stand_duration: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlConfig {
    /// PD stiffness [Nm/rad].
    pub stiffness: f64,
    /// PD damping [Nm·s/rad].
    pub damping: f64,
    /// Policy output → radians.
    pub action_scale_pos: f64,
    /// Ticks per policy inference.
    pub decimation: u32,
    /// Symmetric hard torque bound [Nm].
    pub user_torque_limit: f64,
    /// Additionally limit actions to the band whose PD torque stays within
    /// `user_torque_limit` at the measured state. On unless disabled.
    #[serde(default = "default_true")]
    pub torque_feasible_actions: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NormalizationConfig {
    pub clip_scales: ClipScales,
    pub obs_scales: ObsScales,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClipScales {
    pub clip_observations: f64,
    pub clip_actions: f64,
}

/// Per-field-class observation scaling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObsScales {
    pub lin_vel: f64,
    pub ang_vel: f64,
    pub dof_pos: f64,
    pub dof_vel: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizeConfig {
    pub actions_size: usize,
    pub observations_size: usize,
    pub observations_history_length: usize,
    pub latent_size: usize,
    pub commands_size: usize,
}

/// IMU mounting correction [rad].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ImuOrientationOffset {
    #[serde(default)]
    pub roll: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub yaw: f64,
}

/// Per-axis command scaling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UserCmdScales {
    pub lin_vel_x: f64,
    pub lin_vel_y: f64,
    pub ang_vel_yaw: f64,
}

impl UserCmdScales {
    #[inline]
    pub const fn as_array(&self) -> [f64; COMMAND_AXES] {
        [self.lin_vel_x, self.lin_vel_y, self.ang_vel_yaw]
    }
}

/// Which optional terms the observation vector carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationTerms {
    /// Scaled base linear velocity (3).
    #[serde(default)]
    pub lin_vel: bool,
    /// Gait phase (2) and gait command (3).
    #[serde(default = "default_true")]
    pub gait: bool,
}

impl Default for ObservationTerms {
    fn default() -> Self {
        Self {
            lin_vel: false,
            gait: true,
        }
    }
}

impl ObservationTerms {
    /// Observation length for `joints` joints.
    ///
    /// `[lin_vel 3]? ang_vel 3, gravity 3, dof_pos n, dof_vel n, actions n,
    /// commands 3, [gait_phase 2, gait_command 3]?`
    pub const fn len(&self, joints: usize) -> usize {
        let mut n = 3 + 3 + 3 * joints + COMMAND_AXES;
        if self.lin_vel {
            n += 3;
        }
        if self.gait {
            n += 5;
        }
        n
    }

    /// Width of each term, in observation order. Sums to [`Self::len`].
    pub fn segments(&self, joints: usize) -> FixedVec<usize, MAX_OBSERVATION_TERMS> {
        let mut widths = FixedVec::new();
        let mut put = |w: usize| {
            let _ = widths.push(w);
        };
        if self.lin_vel {
            put(3);
        }
        put(3);
        put(3);
        put(joints);
        put(joints);
        put(joints);
        put(COMMAND_AXES);
        if self.gait {
            put(2);
            put(3);
        }
        widths
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GaitConfig {
    /// Gait frequency [Hz].
    #[serde(default = "default_gait_frequency")]
    pub frequency: f64,
    #[serde(default = "default_gait_phase_offset")]
    pub phase_offset: f64,
    #[serde(default = "default_gait_contact_duration")]
    pub contact_duration: f64,
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            frequency: GAIT_FREQUENCY_DEFAULT,
            phase_offset: GAIT_PHASE_OFFSET_DEFAULT,
            contact_duration: GAIT_CONTACT_DURATION_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_inference_misses")]
    pub max_consecutive_inference_misses: u32,
    #[serde(default = "default_sensor_faults")]
    pub max_consecutive_sensor_faults: u32,
    #[serde(default = "default_actuator_faults")]
    pub max_consecutive_actuator_faults: u32,
    #[serde(default = "default_overruns")]
    pub max_consecutive_overruns: u32,
    /// Inference deadline [µs]. `None` = remaining tick period.
    #[serde(default)]
    pub inference_budget_us: Option<u64>,
    /// Ticks between status log lines.
    #[serde(default = "default_status_interval")]
    pub status_interval: u64,
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_consecutive_inference_misses: MAX_INFERENCE_MISSES_DEFAULT,
            max_consecutive_sensor_faults: MAX_SENSOR_FAULTS_DEFAULT,
            max_consecutive_actuator_faults: MAX_ACTUATOR_FAULTS_DEFAULT,
            max_consecutive_overruns: MAX_OVERRUNS_DEFAULT,
            inference_budget_us: None,
            status_interval: STATUS_INTERVAL_DEFAULT,
            log_level: LogLevel::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HardwareConfig {
    /// Hardware bus index of each joint, in `joint_names` order.
    /// `None` = identity.
    #[serde(default)]
    pub joint_order: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JoystickConfig {
    #[serde(default = "default_axis_scale")]
    pub axis_scale: f64,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            axis_scale: JOYSTICK_AXIS_SCALE_DEFAULT,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_gait_frequency() -> f64 {
    GAIT_FREQUENCY_DEFAULT
}
fn default_gait_phase_offset() -> f64 {
    GAIT_PHASE_OFFSET_DEFAULT
}
fn default_gait_contact_duration() -> f64 {
    GAIT_CONTACT_DURATION_DEFAULT
}
fn default_inference_misses() -> u32 {
    MAX_INFERENCE_MISSES_DEFAULT
}
fn default_sensor_faults() -> u32 {
    MAX_SENSOR_FAULTS_DEFAULT
}
fn default_actuator_faults() -> u32 {
    MAX_ACTUATOR_FAULTS_DEFAULT
}
fn default_overruns() -> u32 {
    MAX_OVERRUNS_DEFAULT
}
fn default_status_interval() -> u64 {
    STATUS_INTERVAL_DEFAULT
}
fn default_axis_scale() -> f64 {
    JOYSTICK_AXIS_SCALE_DEFAULT
}

// ─── Derived Values ─────────────────────────────────────────────────

impl PointfootConfig {
    /// Number of configured joints.
    #[inline]
    pub fn joint_count(&self) -> usize {
        self.joint_names.len()
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.loop_frequency)
    }

    /// Stand phase length in ticks.
    pub fn stand_ticks(&self) -> u64 {
        (self.stand_mode.stand_duration * self.loop_frequency).round() as u64
    }

    /// Length of the flattened history window handed to the policy.
    pub fn history_input_len(&self) -> usize {
        self.size.observations_size * self.size.observations_history_length
    }

    /// Length of the actor input (history window + latent).
    pub fn policy_input_len(&self) -> usize {
        self.history_input_len() + self.size.latent_size
    }

    pub fn joint_set(&self) -> Result<JointSet, ConfigError> {
        JointSet::new(&self.joint_names).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "{} joints exceed the supported maximum of {MAX_JOINTS}",
                self.joint_names.len()
            ))
        })
    }

    /// Default joint angles in `joint_names` order.
    pub fn default_pose(&self) -> Result<JointVec, ConfigError> {
        let mut angles = Vec::with_capacity(self.joint_names.len());
        for name in &self.joint_names {
            let angle = self.init_state.default_joint_angle.get(name).ok_or_else(|| {
                ConfigError::ValidationError(format!("default_joint_angle missing joint '{name}'"))
            })?;
            angles.push(*angle);
        }
        Ok(joint_vec_from(&angles))
    }

    // ─── Validation ─────────────────────────────────────────────────

    /// Validate all bounds and cross-field constraints.
    ///
    /// Any failure is fatal at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.loop_frequency.is_finite()
            && self.loop_frequency > 0.0
            && self.loop_frequency <= LOOP_FREQUENCY_MAX)
        {
            return invalid(format!(
                "loop_frequency {} out of range (0, {LOOP_FREQUENCY_MAX}]",
                self.loop_frequency
            ));
        }

        self.validate_joints()?;
        self.validate_control()?;
        self.validate_normalization()?;
        self.validate_sizes()?;

        let stand = self.stand_mode.stand_duration;
        if !(stand.is_finite() && stand >= 0.0) {
            return invalid(format!("stand_mode.stand_duration {stand} must be >= 0"));
        }

        let off = &self.imu_orientation_offset;
        require_finite("imu_orientation_offset.roll", off.roll)?;
        require_finite("imu_orientation_offset.pitch", off.pitch)?;
        require_finite("imu_orientation_offset.yaw", off.yaw)?;

        let cmd = &self.user_cmd_scales;
        require_finite("user_cmd_scales.lin_vel_x", cmd.lin_vel_x)?;
        require_finite("user_cmd_scales.lin_vel_y", cmd.lin_vel_y)?;
        require_finite("user_cmd_scales.ang_vel_yaw", cmd.ang_vel_yaw)?;

        self.validate_gait()?;
        self.validate_runtime()?;
        self.validate_hardware()?;

        require_finite("joystick.axis_scale", self.joystick.axis_scale)?;
        Ok(())
    }

    fn validate_joints(&self) -> Result<(), ConfigError> {
        let n = self.joint_names.len();
        if n == 0 {
            return invalid("joint_names is empty".into());
        }
        if n > MAX_JOINTS {
            return invalid(format!("{n} joints exceed the supported maximum of {MAX_JOINTS}"));
        }
        let mut seen = HashSet::new();
        for name in &self.joint_names {
            if name.is_empty() {
                return invalid("joint_names contains an empty name".into());
            }
            if !seen.insert(name.as_str()) {
                return invalid(format!("duplicate joint name '{name}'"));
            }
        }
        for (name, angle) in &self.init_state.default_joint_angle {
            if !seen.contains(name.as_str()) {
                return invalid(format!("default_joint_angle names unknown joint '{name}'"));
            }
            require_finite(&format!("default_joint_angle.{name}"), *angle)?;
        }
        if self.init_state.default_joint_angle.len() != n {
            // Some joint has no entry; report which.
            self.default_pose()?;
        }
        Ok(())
    }

    fn validate_control(&self) -> Result<(), ConfigError> {
        let c = &self.control;
        require_non_negative("control.stiffness", c.stiffness)?;
        require_non_negative("control.damping", c.damping)?;
        require_finite("control.action_scale_pos", c.action_scale_pos)?;
        if c.action_scale_pos == 0.0 {
            return invalid("control.action_scale_pos must be non-zero".into());
        }
        if c.decimation == 0 {
            return invalid("control.decimation must be >= 1".into());
        }
        require_positive("control.user_torque_limit", c.user_torque_limit)?;
        Ok(())
    }

    fn validate_normalization(&self) -> Result<(), ConfigError> {
        let clip = &self.normalization.clip_scales;
        require_positive("clip_scales.clip_observations", clip.clip_observations)?;
        require_positive("clip_scales.clip_actions", clip.clip_actions)?;
        let s = &self.normalization.obs_scales;
        require_finite("obs_scales.lin_vel", s.lin_vel)?;
        require_finite("obs_scales.ang_vel", s.ang_vel)?;
        require_finite("obs_scales.dof_pos", s.dof_pos)?;
        require_finite("obs_scales.dof_vel", s.dof_vel)?;
        Ok(())
    }

    fn validate_sizes(&self) -> Result<(), ConfigError> {
        let s = &self.size;
        let n = self.joint_names.len();
        if s.actions_size != n {
            return invalid(format!(
                "size.actions_size {} != joint count {n}",
                s.actions_size
            ));
        }
        if s.observations_history_length == 0 {
            return invalid("size.observations_history_length must be >= 1".into());
        }
        if s.commands_size != COMMAND_AXES {
            return invalid(format!(
                "size.commands_size {} != {COMMAND_AXES}",
                s.commands_size
            ));
        }
        let expected = self.observation.len(n);
        if s.observations_size != expected {
            return invalid(format!(
                "size.observations_size {} != {expected} required by the observation terms \
                 (lin_vel={}, gait={})",
                s.observations_size, self.observation.lin_vel, self.observation.gait
            ));
        }
        Ok(())
    }

    fn validate_gait(&self) -> Result<(), ConfigError> {
        let g = &self.gait;
        require_non_negative("gait.frequency", g.frequency)?;
        if !(0.0..=1.0).contains(&g.phase_offset) {
            return invalid(format!("gait.phase_offset {} out of [0, 1]", g.phase_offset));
        }
        if !(0.0..=1.0).contains(&g.contact_duration) {
            return invalid(format!(
                "gait.contact_duration {} out of [0, 1]",
                g.contact_duration
            ));
        }
        Ok(())
    }

    fn validate_runtime(&self) -> Result<(), ConfigError> {
        let r = &self.runtime;
        if r.max_consecutive_inference_misses == 0
            || r.max_consecutive_sensor_faults == 0
            || r.max_consecutive_actuator_faults == 0
            || r.max_consecutive_overruns == 0
        {
            return invalid("runtime fault thresholds must be >= 1".into());
        }
        if r.status_interval == 0 {
            return invalid("runtime.status_interval must be >= 1".into());
        }
        if r.inference_budget_us == Some(0) {
            return invalid("runtime.inference_budget_us must be > 0".into());
        }
        Ok(())
    }

    fn validate_hardware(&self) -> Result<(), ConfigError> {
        let Some(order) = &self.hardware.joint_order else {
            return Ok(());
        };
        let n = self.joint_names.len();
        if order.len() != n {
            return invalid(format!(
                "hardware.joint_order has {} entries, expected {n}",
                order.len()
            ));
        }
        let mut seen = [false; MAX_JOINTS];
        for &idx in order {
            if idx >= n || seen[idx] {
                return invalid(format!(
                    "hardware.joint_order {order:?} is not a permutation of 0..{n}"
                ));
            }
            seen[idx] = true;
        }
        Ok(())
    }
}

fn invalid<T>(msg: String) -> Result<T, ConfigError> {
    Err(ConfigError::ValidationError(msg))
}

fn require_finite(name: &str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() {
        Ok(())
    } else {
        invalid(format!("{name} must be finite (got {v})"))
    }
}

fn require_non_negative(name: &str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        invalid(format!("{name} must be >= 0 (got {v})"))
    }
}

fn require_positive(name: &str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        invalid(format!("{name} must be > 0 (got {v})"))
    }
}
