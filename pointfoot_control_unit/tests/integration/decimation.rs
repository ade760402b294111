//! Integration test: decimated inference and target hold.
//!
//! Validates: inference only on `tick % decimation == 0`, targets held in
//! between, action clipping and scaling, and the feedback of last actions
//! and navigation commands into the observation.

use pointfoot_common::control_unit::command::{Command, ExternalCommand};
use pointfoot_common::types::ImuSample;
use pointfoot_control_unit::command::handoff::command_channel;

use super::{Behavior, config_with, run_ticks, test_loop};

/// Offsets in the default 32-value observation.
const GRAVITY: usize = 3;
const LAST_ACTIONS: usize = 18;
const COMMANDS: usize = 24;
const GAIT_COMMAND: usize = 29;

fn active_loop(decimation: u32, behavior: Behavior) -> super::TestLoop {
    test_loop(
        config_with(|r| {
            r.stand_mode.stand_duration = 0.0;
            r.control.decimation = decimation;
        }),
        behavior,
    )
}

#[test]
fn infers_every_decimation_ticks() {
    let mut cl = active_loop(4, Behavior::Constant(0.4));
    let inferred: Vec<u64> = (0..12)
        .map(|_| cl.tick())
        .filter(|r| r.inferred)
        .map(|r| r.tick)
        .collect();
    assert_eq!(inferred, vec![0, 4, 8]);
    assert_eq!(cl.policy_mut().calls, 3);
    assert_eq!(cl.stats().inferences, 3);
}

#[test]
fn decimation_one_infers_every_tick() {
    let mut cl = active_loop(1, Behavior::Constant(0.4));
    run_ticks(&mut cl, 7);
    assert_eq!(cl.policy_mut().calls, 7);
}

#[test]
fn targets_hold_between_inferences() {
    let mut cl = active_loop(4, Behavior::Constant(0.4));
    cl.tick();
    assert!(cl.targets().iter().all(|t| (t - 0.1).abs() < 1e-12));

    cl.policy_mut().behavior = Behavior::Constant(0.8);
    for _ in 1..4 {
        cl.tick();
        assert!(cl.targets().iter().all(|t| (t - 0.1).abs() < 1e-12));
        assert_eq!(cl.last_command().target.as_slice(), cl.targets());
    }

    cl.tick();
    assert!(cl.targets().iter().all(|t| (t - 0.2).abs() < 1e-12));
}

#[test]
fn actions_are_clipped_before_scaling() {
    let cfg = config_with(|r| {
        r.stand_mode.stand_duration = 0.0;
        r.normalization.clip_scales.clip_actions = 1.0;
    });
    let mut cl = test_loop(cfg, Behavior::Constant(5.0));
    cl.tick();
    assert_eq!(cl.last_actions(), &[1.0; 6]);
    assert!(cl.targets().iter().all(|t| (t - 0.25).abs() < 1e-12));
}

#[test]
fn torque_respects_user_limit() {
    let cfg = config_with(|r| {
        r.stand_mode.stand_duration = 0.0;
        r.control.user_torque_limit = 2.0;
        r.control.torque_feasible_actions = false;
    });
    // target 0.25 rad away at kp 40 → 10 Nm requested.
    let mut cl = test_loop(cfg, Behavior::Constant(1.0));
    cl.tick();
    assert_eq!(cl.last_actions(), &[1.0; 6]);
    assert!(cl.last_command().torque.iter().all(|t| (t - 2.0).abs() < 1e-12));
}

#[test]
fn actions_stay_torque_feasible_by_default() {
    let cfg = config_with(|r| r.stand_mode.stand_duration = 0.0);
    assert!(cfg.robot.control.torque_feasible_actions);
    // At rest the band is ±(60 / 40) / 0.25 = ±6.
    let mut cl = test_loop(cfg, Behavior::Constant(50.0));
    cl.tick();
    assert!(cl.last_actions().iter().all(|a| (a - 6.0).abs() < 1e-12));
    assert!(cl.targets().iter().all(|t| (t - 1.5).abs() < 1e-12));
    assert!(cl.last_command().torque.iter().all(|t| (t - 60.0).abs() < 1e-9));
}

#[test]
fn last_actions_feed_the_next_observation() {
    let mut cl = active_loop(4, Behavior::Constant(0.4));
    cl.tick();
    // Tick 0's observation was built before inference.
    let first = cl.history().latest().unwrap().to_vec();
    assert!(first[LAST_ACTIONS..LAST_ACTIONS + 6].iter().all(|a| *a == 0.0));

    cl.tick();
    let obs = cl.history().latest().unwrap();
    assert!(obs[LAST_ACTIONS..LAST_ACTIONS + 6].iter().all(|a| *a == 0.4));
    assert_eq!(&obs[GAIT_COMMAND..], &[2.0, 0.5, 0.5]);
}

#[test]
fn velocity_command_is_scaled_into_observation() {
    let mut cl = active_loop(4, Behavior::Constant(0.0));
    let (tx, rx) = command_channel(4, 0.5);
    cl = cl.with_commands(rx);

    tx.send(ExternalCommand::Velocity(Command {
        lin_vel_x: 1.0,
        lin_vel_y: -0.5,
        ang_vel_yaw: 0.2,
    }))
    .unwrap();
    cl.tick();

    let obs = cl.history().latest().unwrap();
    let expected = [2.0, -1.0, 0.05];
    for (o, e) in obs[COMMANDS..COMMANDS + 3].iter().zip(expected) {
        assert!((o - e).abs() < 1e-12, "{o} != {e}");
    }
    assert_eq!(cl.command().lin_vel_x, 1.0);
}

#[test]
fn joystick_command_replaces_velocity() {
    let mut cl = active_loop(4, Behavior::Constant(0.0));
    let (tx, rx) = command_channel(4, 0.5);
    cl = cl.with_commands(rx);

    tx.send(ExternalCommand::Velocity(Command {
        lin_vel_x: 1.0,
        ..Command::default()
    }))
    .unwrap();
    tx.send(ExternalCommand::Joystick { axes: [0.0, 0.0, 1.0] }).unwrap();
    cl.tick();
    assert_eq!(cl.command().lin_vel_x, 0.0);
}

#[test]
fn tilted_imu_reaches_the_observation() {
    let mut cl = active_loop(4, Behavior::Constant(0.0));
    // Rolled 90° about x, spinning about x and y.
    let half = std::f64::consts::FRAC_PI_4;
    cl.io_mut().set_imu(ImuSample {
        quat: [half.cos(), half.sin(), 0.0, 0.0],
        gyro: [4.0, -8.0, 0.0],
        ..ImuSample::upright()
    });
    cl.tick();

    let obs = cl.history().latest().unwrap();
    // ang_vel scale 0.25
    let ang_vel = &obs[..GRAVITY];
    assert!((ang_vel[0] - 1.0).abs() < 1e-9, "{ang_vel:?}");
    assert!((ang_vel[1] + 2.0).abs() < 1e-9, "{ang_vel:?}");
    assert!(ang_vel[2].abs() < 1e-9, "{ang_vel:?}");
    let gravity = &obs[GRAVITY..GRAVITY + 3];
    assert!(gravity[0].abs() < 1e-9, "{gravity:?}");
    assert!((gravity[1] + 1.0).abs() < 1e-9, "{gravity:?}");
    assert!(gravity[2].abs() < 1e-9, "{gravity:?}");
}
