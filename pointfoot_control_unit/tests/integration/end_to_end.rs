//! Integration test: full pipeline against the simulated plant.
//!
//! Validates: dense-model JSON → latent policy → control loop → mapped
//! robot I/O, convergence to the commanded pose, and the paced run with its
//! final disabled command.

use std::io::Write;

use pointfoot_common::control_unit::command::ExternalCommand;
use pointfoot_common::control_unit::state::ControllerMode;
use pointfoot_control_unit::command::handoff::command_channel;
use pointfoot_control_unit::cycle::ControlLoop;
use pointfoot_control_unit::io::robot::{JointMap, MappedIo};
use pointfoot_control_unit::io::sim::{SimParams, SimulatedRobot};
use pointfoot_control_unit::policy::latent::LatentPolicy;
use pointfoot_control_unit::policy::model::{DenseModel, ZeroModel};
use serde_json::json;

use super::config_with;

/// Single affine layer: zero weights, constant bias.
fn constant_model_json(inputs: usize, outputs: usize, bias: f64) -> String {
    json!({
        "layers": [{
            "weights": vec![vec![0.0; inputs]; outputs],
            "bias": vec![bias; outputs],
            "activation": "identity",
        }]
    })
    .to_string()
}

#[test]
fn dense_policy_drives_robot_to_target() {
    let cfg = config_with(|r| r.stand_mode.stand_duration = 0.1);
    let history = cfg.robot.history_input_len();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(constant_model_json(history + 3, 6, 0.2).as_bytes())
        .unwrap();
    let actor = DenseModel::from_json_file(file.path()).unwrap();
    let policy = LatentPolicy::for_config(&cfg, ZeroModel::new(history, 3), actor).unwrap();

    let sim = SimulatedRobot::new(6, SimParams::default());
    let mut cl = ControlLoop::new(cfg, policy, sim).unwrap();

    for _ in 0..1000 {
        cl.tick();
    }
    assert_eq!(cl.mode(), ControllerMode::PolicyActive);
    // bias 0.2 · action_scale_pos 0.25
    for q in cl.io().position() {
        assert!((q - 0.05).abs() < 1e-3, "joint at {q}");
    }
    assert_eq!(cl.policy_mut().latent(), &[0.0; 3]);
}

#[test]
fn hardware_order_is_mapped() {
    let cfg = config_with(|r| {
        r.init_state
            .default_joint_angle
            .insert("knee_L_Joint".into(), 0.6);
    });
    let history = cfg.robot.history_input_len();
    let policy = LatentPolicy::for_config(
        &cfg,
        ZeroModel::new(history, 3),
        ZeroModel::new(history + 3, 6),
    )
    .unwrap();
    let map = JointMap::new(cfg.robot.hardware.joint_order.as_deref(), 6).unwrap();
    let io = MappedIo::new(SimulatedRobot::new(6, SimParams::default()), map);
    let mut cl = ControlLoop::new(cfg, policy, io).unwrap();

    for _ in 0..1500 {
        cl.tick();
    }
    // knee_L is policy joint 2, wired to bus slot 1.
    let hw = cl.io().inner().position();
    assert!((hw[1] - 0.6).abs() < 1e-3, "{hw:?}");
    assert!(hw[2].abs() < 1e-3, "{hw:?}");
    assert!((cl.targets()[2] - 0.6).abs() < 1e-12);
}

#[test]
fn paced_run_ends_with_disabled_command() {
    let cfg = config_with(|r| r.stand_mode.stand_duration = 0.02);
    let history = cfg.robot.history_input_len();
    let policy = LatentPolicy::for_config(
        &cfg,
        ZeroModel::new(history, 3),
        ZeroModel::new(history + 3, 6),
    )
    .unwrap();
    let mut cl = ControlLoop::new(cfg, policy, SimulatedRobot::new(6, SimParams::default())).unwrap();

    assert_eq!(cl.run_for(Some(40)).unwrap(), 40);
    assert_eq!(cl.mode(), ControllerMode::PolicyActive);
    assert_eq!(cl.io().writes(), 41);
    let last = cl.io().last_command().unwrap();
    assert!(!last.enable);
    assert!(last.torque.iter().all(|t| *t == 0.0));
    assert_eq!(cl.stats().cycle_count, 40);
}

#[test]
fn stop_command_ends_paced_run() {
    let cfg = config_with(|_| {});
    let history = cfg.robot.history_input_len();
    let policy = LatentPolicy::for_config(
        &cfg,
        ZeroModel::new(history, 3),
        ZeroModel::new(history + 3, 6),
    )
    .unwrap();
    let (tx, rx) = command_channel(4, 0.5);
    let mut cl = ControlLoop::new(cfg, policy, SimulatedRobot::new(6, SimParams::default()))
        .unwrap()
        .with_commands(rx);

    let stopper = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        tx.send(ExternalCommand::Stop).unwrap();
    });
    let ticks = cl.run_for(Some(5_000)).unwrap();
    stopper.join().unwrap();

    assert!(ticks < 5_000);
    assert!(!cl.io().last_command().unwrap().enable);
}

#[test]
fn robot_at_rest_needs_no_torque() {
    // 6 joints, decimation 4, 1.0 s stand at 500 Hz, zero policy.
    let cfg = config_with(|_| {});
    let history = cfg.robot.history_input_len();
    let policy = LatentPolicy::for_config(
        &cfg,
        ZeroModel::new(history, 3),
        ZeroModel::new(history + 3, 6),
    )
    .unwrap();
    let mut cl = ControlLoop::new(cfg, policy, SimulatedRobot::new(6, SimParams::default())).unwrap();

    for _ in 0..500 {
        cl.tick();
    }
    assert_eq!(cl.mode(), ControllerMode::Standing);
    let report = cl.tick();
    assert_eq!(report.mode, ControllerMode::PolicyActive);
    assert!(cl.last_command().torque.iter().all(|t| t.abs() < 1e-9));
}
