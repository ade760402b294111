//! Shared fixtures for the integration tests.

mod decimation;
mod end_to_end;
mod fault_handling;
mod stand_transition;
mod startup;

use std::time::Duration;

use pointfoot_common::control_unit::config::PointfootConfig;
use pointfoot_control_unit::config::{LoadedConfig, load_config_from_str};
use pointfoot_control_unit::cycle::ControlLoop;
use pointfoot_control_unit::io::sim::{SimParams, SimulatedRobot};
use pointfoot_control_unit::observation::buffer::Window;
use pointfoot_control_unit::policy::port::{PolicyError, PolicyPort};

pub const SAMPLE_TOML: &str = include_str!("../../config/pointfoot.toml");

/// Sample config with `edit` applied, re-validated.
///
/// The inference deadline is raised so slow hosts never miss by accident.
pub fn config_with(edit: impl FnOnce(&mut PointfootConfig)) -> LoadedConfig {
    let mut robot = load_config_from_str(SAMPLE_TOML).unwrap().robot;
    robot.runtime.inference_budget_us = Some(1_000_000);
    edit(&mut robot);
    LoadedConfig::from_config(robot).unwrap()
}

/// What the test policy does on each call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    Constant(f64),
    Fail,
    NonFinite,
    /// Sleep, then write the value.
    Slow(Duration, f64),
}

#[derive(Debug)]
pub struct TestPolicy {
    pub behavior: Behavior,
    pub calls: u64,
}

impl TestPolicy {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: 0,
        }
    }
}

impl PolicyPort for TestPolicy {
    fn actions_len(&self) -> usize {
        6
    }

    fn infer(&mut self, _history: Window<'_>, actions: &mut [f64]) -> Result<(), PolicyError> {
        self.calls += 1;
        let value = match self.behavior {
            Behavior::Constant(v) => v,
            Behavior::Fail => return Err(PolicyError::Model("injected failure".into())),
            Behavior::NonFinite => f64::NAN,
            Behavior::Slow(d, v) => {
                std::thread::sleep(d);
                v
            }
        };
        actions.iter_mut().for_each(|a| *a = value);
        Ok(())
    }
}

pub type TestLoop = ControlLoop<TestPolicy, SimulatedRobot>;

/// Loop over a simulated robot at rest at zero.
pub fn test_loop(config: LoadedConfig, behavior: Behavior) -> TestLoop {
    let sim = SimulatedRobot::new(config.joint_count(), SimParams::default());
    ControlLoop::new(config, TestPolicy::new(behavior), sim).unwrap()
}

/// Run `n` unpaced ticks.
pub fn run_ticks(cl: &mut TestLoop, n: u64) {
    for _ in 0..n {
        cl.tick();
    }
}
