//! Integration test: stand blend → policy hand-over.
//!
//! Validates: linear blend from the measured pose to the default pose,
//! PolicyActive exactly after `stand_ticks`, first inference on the engage
//! tick, and re-entering Standing on request.

use pointfoot_common::control_unit::command::ExternalCommand;
use pointfoot_common::control_unit::state::ControllerMode;
use pointfoot_control_unit::command::handoff::command_channel;
use pointfoot_control_unit::cycle::ControlLoop;
use pointfoot_control_unit::io::sim::{SimParams, SimulatedRobot};

use super::{Behavior, TestPolicy, config_with, test_loop};

const START: f64 = 0.3;

fn loop_from_pose(stand_duration: f64) -> super::TestLoop {
    let cfg = config_with(|r| r.stand_mode.stand_duration = stand_duration);
    // Heavy joints barely move while the blend is checked.
    let params = SimParams {
        inertia: 1.0e6,
        ..SimParams::default()
    };
    let sim = SimulatedRobot::new(6, params).with_pose(&[START; 6]);
    ControlLoop::new(cfg, TestPolicy::new(Behavior::Constant(0.4)), sim).unwrap()
}

#[test]
fn blend_runs_for_stand_ticks_then_engages() {
    let mut cl = loop_from_pose(1.0);
    assert_eq!(cl.stand().total_ticks(), 500);

    for tick in 0..500u64 {
        let report = cl.tick();
        assert_eq!(report.mode, ControllerMode::Standing, "tick {tick}");
        assert!(!report.inferred);
        let expected = (1.0 - tick as f64 / 500.0) * START;
        assert!(
            cl.targets().iter().all(|t| (t - expected).abs() < 1e-9),
            "tick {tick}: {:?} != {expected}",
            cl.targets()
        );
    }
    assert_eq!(cl.policy_mut().calls, 0);

    // Tick 500: blend complete, policy engaged, 500 % 4 == 0 → infer now.
    let report = cl.tick();
    assert_eq!(report.tick, 500);
    assert_eq!(report.mode, ControllerMode::PolicyActive);
    assert!(report.inferred);
    assert_eq!(cl.policy_mut().calls, 1);
    assert_eq!(cl.stand().engagements(), 1);
    // default 0 + 0.4 · action_scale_pos 0.25
    assert!(cl.targets().iter().all(|t| (t - 0.1).abs() < 1e-12));
}

#[test]
fn blend_midpoint_is_halfway() {
    let mut cl = loop_from_pose(1.0);
    for _ in 0..=250 {
        cl.tick();
    }
    assert!(cl.targets().iter().all(|t| (t - START / 2.0).abs() < 1e-9));
    assert!((cl.stand().fraction() - 251.0 / 500.0).abs() < 1e-12);
}

#[test]
fn zero_stand_duration_engages_on_first_tick() {
    let mut cl = test_loop(config_with(|r| r.stand_mode.stand_duration = 0.0), Behavior::Constant(0.4));
    let report = cl.tick();
    assert_eq!(report.mode, ControllerMode::PolicyActive);
    assert!(report.inferred);
}

#[test]
fn engage_off_decimation_boundary_holds_default_pose() {
    // 3 stand ticks → engage on tick 3, next inference on tick 4.
    let cfg = config_with(|r| r.stand_mode.stand_duration = 3.0 / 500.0);
    assert_eq!(cfg.robot.stand_ticks(), 3);
    let mut cl = test_loop(cfg, Behavior::Constant(0.4));

    for _ in 0..3 {
        assert_eq!(cl.tick().mode, ControllerMode::Standing);
    }
    let report = cl.tick();
    assert_eq!(report.mode, ControllerMode::PolicyActive);
    assert!(!report.inferred);
    assert!(cl.targets().iter().all(|t| *t == 0.0));

    let report = cl.tick();
    assert!(report.inferred);
    assert!(cl.targets().iter().all(|t| (t - 0.1).abs() < 1e-12));
}

#[test]
fn force_stand_reenters_blend_from_measured_pose() {
    let mut cl = loop_from_pose(0.0);
    let (tx, rx) = command_channel(4, 0.5);
    cl = cl.with_commands(rx);

    assert_eq!(cl.tick().mode, ControllerMode::PolicyActive);
    tx.send(ExternalCommand::ForceStand).unwrap();

    // stand_duration 0 → the forced blend completes on the next step, so the
    // request shows as a second engagement.
    let report = cl.tick();
    assert_eq!(report.mode, ControllerMode::PolicyActive);
    assert_eq!(cl.stand().engagements(), 2);
}

#[test]
fn force_stand_with_long_blend_stays_standing() {
    let mut cl = loop_from_pose(1.0);
    let (tx, rx) = command_channel(4, 0.5);
    cl = cl.with_commands(rx);
    super::run_ticks(&mut cl, 501);
    assert_eq!(cl.mode(), ControllerMode::PolicyActive);

    tx.send(ExternalCommand::ForceStand).unwrap();
    let report = cl.tick();
    assert_eq!(report.mode, ControllerMode::Standing);
    assert!(!report.inferred);

    // Blend restarts from the measured pose, not from the last target.
    let measured = cl.io().position()[0];
    assert!((cl.targets()[0] - measured).abs() < 1e-6);
}
