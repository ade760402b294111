//! Integration test: fault handling.
//!
//! Validates: inference deadline and hold, escalation to Standing, per-value
//! sensor hold, actuator rejection, and the latched halt for persistent
//! sensor, actuator and timing faults.

use std::time::Duration;

use pointfoot_common::control_unit::error::ControlFaults;
use pointfoot_common::control_unit::state::{ControllerMode, SafetyState};

use super::{Behavior, TestLoop, config_with, run_ticks, test_loop};

fn active_loop(behavior: Behavior) -> TestLoop {
    test_loop(
        config_with(|r| {
            r.stand_mode.stand_duration = 0.0;
            r.control.decimation = 1;
        }),
        behavior,
    )
}

fn assert_halted_output(cl: &TestLoop) {
    let cmd = cl.io().last_command().unwrap();
    assert!(!cmd.enable);
    assert!(cmd.torque.iter().all(|t| *t == 0.0));
}

// ─── Inference ──────────────────────────────────────────────────────

#[test]
fn late_inference_is_discarded() {
    let cfg = config_with(|r| {
        r.stand_mode.stand_duration = 0.0;
        r.runtime.inference_budget_us = Some(100);
    });
    let mut cl = test_loop(cfg, Behavior::Slow(Duration::from_millis(5), 0.4));

    let report = cl.tick();
    assert!(!report.inferred);
    assert!(report.faults.contains(ControlFaults::INFERENCE_TIMEOUT));
    assert_eq!(report.safety, SafetyState::Degraded);
    assert!(cl.targets().iter().all(|t| *t == 0.0));
    assert_eq!(cl.last_actions(), &[0.0; 6]);
    assert_eq!(cl.stats().inference_misses, 1);
}

#[test]
fn failed_inference_holds_previous_target() {
    let mut cl = active_loop(Behavior::Constant(0.4));
    cl.tick();
    assert!(cl.targets().iter().all(|t| (t - 0.1).abs() < 1e-12));

    cl.policy_mut().behavior = Behavior::Fail;
    let report = cl.tick();
    assert!(!report.inferred);
    assert!(report.faults.contains(ControlFaults::INFERENCE_TIMEOUT));
    assert!(cl.targets().iter().all(|t| (t - 0.1).abs() < 1e-12));
    assert_eq!(cl.last_actions(), &[0.4; 6]);
    assert!(cl.last_command().enable);
}

#[test]
fn non_finite_actions_are_discarded() {
    let mut cl = active_loop(Behavior::NonFinite);
    let report = cl.tick();
    assert!(report.faults.contains(ControlFaults::INFERENCE_TIMEOUT));
    assert!(cl.targets().iter().all(|t| t.is_finite()));
    assert!(cl.last_command().torque.iter().all(|t| t.is_finite()));
}

#[test]
fn good_inference_clears_the_streak() {
    let mut cl = active_loop(Behavior::Fail);
    run_ticks(&mut cl, 2);
    assert_eq!(cl.monitor().inference_streak(), 2);

    cl.policy_mut().behavior = Behavior::Constant(0.0);
    assert!(cl.tick().inferred);
    assert_eq!(cl.monitor().inference_streak(), 0);
}

#[test]
fn repeated_misses_force_standing() {
    // Limit 3: the fourth consecutive miss escalates.
    let mut cl = active_loop(Behavior::Fail);
    for _ in 0..3 {
        let report = cl.tick();
        assert_eq!(report.mode, ControllerMode::PolicyActive);
        assert!(!report.faults.contains(ControlFaults::INFERENCE_ESCALATED));
    }

    let report = cl.tick();
    assert!(report.faults.contains(ControlFaults::INFERENCE_ESCALATED));
    assert_eq!(report.mode, ControllerMode::Standing);
    assert_eq!(cl.monitor().inference_streak(), 0);
    assert_eq!(cl.monitor().totals().escalations, 1);
    assert!(!cl.monitor().is_halted());

    // Zero-length blend: engaged again on the next tick, streak restarted.
    let report = cl.tick();
    assert_eq!(report.mode, ControllerMode::PolicyActive);
    assert_eq!(cl.stand().engagements(), 2);
    assert_eq!(cl.monitor().inference_streak(), 1);
}

// ─── Sensors ────────────────────────────────────────────────────────

#[test]
fn corrupt_values_are_held() {
    let mut cl = active_loop(Behavior::Constant(0.0));
    cl.tick();

    cl.io_mut().corrupt_next_reads(1);
    let report = cl.tick();
    assert!(report.faults.contains(ControlFaults::SENSOR_FAULT));
    assert!(!report.failed);
    assert!(cl.last_command().enable);
    assert!(cl.last_command().torque.iter().all(|t| t.is_finite()));
    assert!(cl.history().latest().unwrap().iter().all(|v| v.is_finite()));

    assert!(!cl.tick().faults.contains(ControlFaults::SENSOR_FAULT));
}

#[test]
fn lost_sensors_latch_halt() {
    // Limit 10: the eleventh consecutive faulty read latches.
    let mut cl = active_loop(Behavior::Constant(0.0));
    cl.tick();
    cl.io_mut().fail_next_reads(11);

    for _ in 0..10 {
        let report = cl.tick();
        assert!(report.faults.contains(ControlFaults::SENSOR_FAULT));
        assert!(!report.failed);
        assert_ne!(report.safety, SafetyState::Halted);
    }

    let report = cl.tick();
    assert_eq!(report.tick, 11);
    assert!(report.faults.contains(ControlFaults::SENSOR_LOST));
    assert_eq!(report.safety, SafetyState::Halted);
    assert_halted_output(&cl);

    // Sensors recover; the halt stays latched and the loop keeps ticking.
    for _ in 0..5 {
        let report = cl.tick();
        assert_eq!(report.safety, SafetyState::Halted);
        assert_halted_output(&cl);
    }
    assert_eq!(cl.tick_index(), 17);
    assert!(cl.monitor().latched().contains(ControlFaults::SENSOR_LOST));
}

#[test]
fn halt_latched_while_standing_outlasts_the_blend() {
    // Default 1.0 s blend: engage would happen at tick 500.
    let mut cl = test_loop(config_with(|_| {}), Behavior::Constant(0.4));
    cl.tick();
    cl.io_mut().fail_next_reads(11);
    run_ticks(&mut cl, 10);
    assert!(!cl.monitor().is_halted());

    let report = cl.tick();
    assert_eq!(report.tick, 11);
    assert_eq!(report.mode, ControllerMode::Standing);
    assert_eq!(report.safety, SafetyState::Halted);
    assert_halted_output(&cl);

    for _ in 12..=600 {
        let report = cl.tick();
        assert_eq!(report.safety, SafetyState::Halted, "tick {}", report.tick);
        assert_halted_output(&cl);
    }
    assert_eq!(cl.tick_index(), 601);
    assert!(cl.monitor().latched().contains(ControlFaults::SENSOR_LOST));
}

// ─── Actuators ──────────────────────────────────────────────────────

#[test]
fn rejected_command_fails_the_tick_only() {
    let mut cl = active_loop(Behavior::Constant(0.0));
    cl.tick();
    cl.io_mut().reject_next_writes(1);

    let report = cl.tick();
    assert!(report.failed);
    assert!(report.faults.contains(ControlFaults::ACTUATOR_FAULT));
    assert!(!cl.monitor().is_halted());

    let report = cl.tick();
    assert!(!report.failed);
    assert_eq!(cl.stats().failed_ticks, 1);
}

#[test]
fn lost_actuators_latch_halt() {
    let mut cl = active_loop(Behavior::Constant(0.0));
    cl.io_mut().reject_next_writes(11);
    run_ticks(&mut cl, 10);
    assert!(!cl.monitor().is_halted());

    let report = cl.tick();
    assert!(report.faults.contains(ControlFaults::ACTUATOR_LOST));
    assert!(cl.monitor().is_halted());

    cl.tick();
    assert_halted_output(&cl);
}

// ─── Timing ─────────────────────────────────────────────────────────

#[test]
fn persistent_overruns_latch_halt() {
    let cfg = config_with(|r| {
        r.stand_mode.stand_duration = 0.0;
        r.control.decimation = 1;
        r.runtime.max_consecutive_overruns = 2;
    });
    // 3 ms of inference in a 2 ms period.
    let mut cl = test_loop(cfg, Behavior::Slow(Duration::from_millis(3), 0.0));

    for _ in 0..2 {
        let report = cl.tick();
        assert!(report.faults.contains(ControlFaults::TICK_OVERRUN));
        assert!(!cl.monitor().is_halted());
    }
    let report = cl.tick();
    assert!(report.faults.contains(ControlFaults::OVERRUN_PERSISTENT));
    assert_eq!(report.safety, SafetyState::Halted);
    assert_eq!(cl.stats().overruns, 3);
}
