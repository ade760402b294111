//! Integration test: startup sequence.
//!
//! Validates: config loading → derived sizes → loop construction → behaviour
//! of the first ticks, including ticks before any valid sensor frame.

use pointfoot_common::control_unit::error::ControlFaults;
use pointfoot_common::control_unit::state::{ControllerMode, SafetyState};
use pointfoot_control_unit::config::load_config_from_str;
use pointfoot_control_unit::cycle::ControlLoop;
use pointfoot_control_unit::error::ControlError;
use pointfoot_control_unit::io::sim::{SimParams, SimulatedRobot};
use pointfoot_control_unit::policy::latent::LatentPolicy;
use pointfoot_control_unit::policy::model::ZeroModel;
use pointfoot_control_unit::policy::port::PolicyError;
use pointfoot_control_unit::state::stand::StandState;

use super::{Behavior, SAMPLE_TOML, config_with, run_ticks, test_loop};

#[test]
fn sample_config_derives_sizes() {
    let cfg = load_config_from_str(SAMPLE_TOML).unwrap();
    assert_eq!(cfg.joint_count(), 6);
    assert_eq!(cfg.robot.size.observations_size, 32);
    assert_eq!(cfg.robot.history_input_len(), 5 * 32);
    assert_eq!(cfg.robot.policy_input_len(), 5 * 32 + 3);
    assert_eq!(cfg.robot.stand_ticks(), 500);
}

#[test]
fn observation_size_must_match_terms() {
    // Gait terms off → 27 values, but the file still says 32.
    let text = SAMPLE_TOML.replace("gait = true", "gait = false");
    assert!(load_config_from_str(&text).is_err());

    let text = text.replace("observations_size = 32", "observations_size = 27");
    assert_eq!(load_config_from_str(&text).unwrap().robot.size.observations_size, 27);
}

#[test]
fn bad_joint_order_is_rejected() {
    let text = SAMPLE_TOML.replace("joint_order = [0, 3, 1, 4, 2, 5]", "joint_order = [0, 0, 1, 4, 2, 5]");
    assert!(load_config_from_str(&text).is_err());
}

#[test]
fn latent_policy_shapes_are_checked() {
    let cfg = config_with(|_| {});
    let history = cfg.robot.history_input_len();

    let ok = LatentPolicy::for_config(&cfg, ZeroModel::new(history, 3), ZeroModel::new(history + 3, 6));
    assert!(ok.is_ok());

    let bad_actor = LatentPolicy::for_config(&cfg, ZeroModel::new(history, 3), ZeroModel::new(history, 6));
    assert!(matches!(bad_actor, Err(PolicyError::Shape(_))));

    let bad_encoder = LatentPolicy::for_config(&cfg, ZeroModel::new(history, 2), ZeroModel::new(history + 3, 6));
    assert!(matches!(bad_encoder, Err(PolicyError::Shape(_))));
}

#[test]
fn loop_builds_with_latent_policy() {
    let cfg = config_with(|_| {});
    let history = cfg.robot.history_input_len();
    let policy =
        LatentPolicy::for_config(&cfg, ZeroModel::new(history, 3), ZeroModel::new(history + 3, 6)).unwrap();
    let sim = SimulatedRobot::new(6, SimParams::default());
    let mut cl = ControlLoop::new(cfg, policy, sim).unwrap();
    let report = cl.tick();
    assert_eq!(report.mode, ControllerMode::Standing);
    assert!(!report.failed);
}

#[test]
fn wrong_action_count_is_fatal() {
    let cfg = config_with(|_| {});
    let history = cfg.robot.history_input_len();
    let policy = LatentPolicy::new(ZeroModel::new(history, 3), ZeroModel::new(history + 3, 4), history, 3, 4)
        .unwrap();
    let sim = SimulatedRobot::new(6, SimParams::default());
    assert!(matches!(
        ControlLoop::new(cfg, policy, sim),
        Err(ControlError::PolicyShape { expected: 6, actual: 4 })
    ));
}

#[test]
fn ticks_before_first_frame_emit_disabled_commands() {
    let mut cl = test_loop(config_with(|_| {}), Behavior::Constant(0.0));
    cl.io_mut().fail_next_reads(3);

    for expected in 0..3 {
        let report = cl.tick();
        assert_eq!(report.tick, expected);
        assert!(report.failed);
        assert!(report.faults.contains(ControlFaults::SENSOR_FAULT));
        assert_eq!(report.safety, SafetyState::Degraded);

        let cmd = cl.io().last_command().unwrap();
        assert!(!cmd.enable);
        assert!(cmd.torque.iter().all(|t| *t == 0.0));
    }
    assert!(cl.history().is_empty());
    assert!(matches!(
        cl.stand().state(),
        StandState::Standing { elapsed_ticks: 0, start_pose: None }
    ));
    assert_eq!(cl.tick_index(), 3);

    let report = cl.tick();
    assert!(!report.failed);
    assert!(!report.faults.contains(ControlFaults::SENSOR_FAULT));
    assert_eq!(cl.history().len(), 1);
    assert!(cl.last_command().enable);
    assert_eq!(cl.stats().failed_ticks, 3);
}

#[test]
fn corrupt_first_frame_is_not_adopted() {
    let mut cl = test_loop(config_with(|_| {}), Behavior::Constant(0.0));
    cl.io_mut().corrupt_next_reads(1);
    assert!(cl.tick().failed);
    assert!(cl.history().is_empty());
    run_ticks(&mut cl, 1);
    assert_eq!(cl.history().len(), 1);
}

#[test]
fn history_fills_to_capacity() {
    let mut cl = test_loop(config_with(|_| {}), Behavior::Constant(0.0));
    run_ticks(&mut cl, 8);
    assert_eq!(cl.history().len(), 5);
    assert_eq!(cl.history().pushes(), 8);
    assert_eq!(cl.history().latest().unwrap().len(), 32);
}
