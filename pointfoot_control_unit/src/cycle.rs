//! Fixed-frequency control cycle.
//!
//! Implements the joint control loop with `clock_nanosleep(TIMER_ABSTIME)`
//! pacing, per-tick timing, overrun detection and the tick body.
//!
//! ## RT Setup Sequence
//! 1. Pre-allocate all runtime state (zero heap in loop).
//! 2. `mlockall(MCL_CURRENT | MCL_FUTURE)`: lock all pages.
//! 3. Prefault stack pages.
//! 4. `sched_setaffinity`: pin to an isolated CPU core.
//! 5. `sched_setscheduler(SCHED_FIFO, prio)`: RT priority.
//!
//! ## Tick Body
//! 1. Drain the command handoff.
//! 2. Read sensors; hold the last value of every non-finite scalar.
//! 3. Normalize → assemble → push into the history ring.
//! 4. Standing: blended target. PolicyActive: infer every `decimation`
//!    ticks under a deadline, otherwise hold the target.
//! 5. PD servo with the hard torque clamp (or the latched halt).
//! 6. Write the command.
//!
//! The loop stops only between ticks. On stop it emits one disabled
//! zero-torque command.

use std::time::{Duration, Instant};

use pointfoot_common::control_unit::command::Command;
use pointfoot_common::control_unit::error::ControlFaults;
use pointfoot_common::control_unit::state::{ControllerMode, SafetyState};
use pointfoot_common::types::{JointCommand, JointVec, SensorFrame};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::command::handoff::{CommandReceiver, StopHandle};
use crate::config::LoadedConfig;
use crate::control::action::ActionPostprocessor;
use crate::control::pd::{PdController, PdGains};
use crate::error::ControlError;
use crate::observation::assembler::ObservationAssembler;
use crate::observation::buffer::ObservationBuffer;
use crate::observation::imu::{BodyImu, ImuFrontEnd};
use crate::observation::normalizer::{NormalizedState, Normalizer, RawSignals};
use crate::policy::port::{PolicyError, PolicyPort};
use crate::io::robot::RobotIo;
use crate::safety::monitor::{FaultLimits, FaultMonitor};
use crate::state::stand::{StandModeController, StandStep};

/// Scalars in a sensor frame besides the joint arrays
/// (quaternion 4, gyro 3, accelerometer 3, base velocity 3).
const FRAME_NON_JOINT_SCALARS: usize = 13;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-tick timing and outcome statistics.
///
/// Updated every tick with no allocation.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total ticks executed.
    pub cycle_count: u64,
    /// Last tick body duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum tick body duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum tick body duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Running sum of squares for stddev computation.
    pub sum_sq_cycle_ns: i128,
    /// Ticks whose body exceeded the period.
    pub overruns: u64,
    /// Maximum wake-up latency [ns] (time between expected and actual wake).
    pub max_latency_ns: i64,
    /// Policy calls whose result was applied.
    pub inferences: u64,
    /// Policy calls discarded (late, failed or non-finite).
    pub inference_misses: u64,
    /// Longest policy call [ns].
    pub max_inference_ns: i64,
    /// Ticks marked failed (no valid sensor frame yet, or command rejected).
    pub failed_ticks: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            sum_sq_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
            inferences: 0,
            inference_misses: 0,
            max_inference_ns: 0,
            failed_ticks: 0,
        }
    }

    /// Record a tick body duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        if duration_ns < self.min_cycle_ns {
            self.min_cycle_ns = duration_ns;
        }
        if duration_ns > self.max_cycle_ns {
            self.max_cycle_ns = duration_ns;
        }
        self.sum_cycle_ns += duration_ns;
        self.sum_sq_cycle_ns += (duration_ns as i128) * (duration_ns as i128);
    }

    #[inline]
    pub fn record_latency(&mut self, latency_ns: i64) {
        if latency_ns > self.max_latency_ns {
            self.max_latency_ns = latency_ns;
        }
    }

    #[inline]
    pub fn record_inference(&mut self, duration_ns: i64) {
        if duration_ns > self.max_inference_ns {
            self.max_inference_ns = duration_ns;
        }
    }

    /// Average tick time [ns] (returns 0 if no ticks).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }

    /// Population standard deviation of the tick time [ns].
    pub fn stddev_cycle_ns(&self) -> f64 {
        if self.cycle_count == 0 {
            return 0.0;
        }
        let n = self.cycle_count as f64;
        let mean = self.sum_cycle_ns as f64 / n;
        let var = self.sum_sq_cycle_ns as f64 / n - mean * mean;
        var.max(0.0).sqrt()
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Errors during RT setup or loop pacing.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),

    /// Monotonic clock unavailable.
    #[error("clock error: {0}")]
    Clock(String),
}

/// Lock all current and future memory pages (prevent page faults in RT loop).
///
/// No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 512 KiB of stack so the pages exist before the loop starts.
fn prefault_stack() {
    let mut buf = [0u8; 512 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, aligned, exclusive reference.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

/// Pin the current thread to a CPU core.
#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

/// Set SCHED_FIFO with the given RT priority.
#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` is a valid sched_param; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Full RT setup sequence. Call once before entering the loop.
///
/// Without the `rt` feature every step except the stack prefault is a no-op.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    info!("RT setup done (cpu {cpu_core}, priority {rt_priority})");
    Ok(())
}

// ─── Tick Outcome ───────────────────────────────────────────────────

/// Summary of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Index of the tick just executed.
    pub tick: u64,
    /// Mode after the tick.
    pub mode: ControllerMode,
    /// A policy result was applied this tick.
    pub inferred: bool,
    /// Faults raised this tick.
    pub faults: ControlFaults,
    /// No valid command could be produced, or the actuator rejected it.
    pub failed: bool,
    pub safety: SafetyState,
}

/// Why a policy result was discarded.
#[derive(Debug, Error)]
enum InferenceMiss {
    #[error("took {took:?}, budget {budget:?}")]
    Late { took: Duration, budget: Duration },

    #[error(transparent)]
    Failed(#[from] PolicyError),

    #[error("non-finite action for joint {0}")]
    NonFinite(usize),
}

// ─── Control Loop ───────────────────────────────────────────────────

/// The fixed-frequency joint control loop.
///
/// Owns all runtime state. Everything the tick touches is allocated in
/// [`ControlLoop::new`].
pub struct ControlLoop<P, R> {
    config: LoadedConfig,
    policy: P,
    io: R,

    imu: ImuFrontEnd,
    normalizer: Normalizer,
    assembler: ObservationAssembler,
    history: ObservationBuffer,
    postprocessor: ActionPostprocessor,
    pd: PdController,
    stand: StandModeController,
    monitor: FaultMonitor,

    commands: Option<CommandReceiver>,
    stop: StopHandle,

    /// Last known sensor values (non-finite reads are held).
    frame: SensorFrame,
    have_frame: bool,
    body: BodyImu,
    command: Command,
    normalized: NormalizedState,
    observation: Vec<f64>,
    /// Policy output scratch.
    actions: Vec<f64>,
    /// Last applied (clipped) actions, fed back into the observation.
    last_actions: Vec<f64>,
    targets: JointVec,
    output: JointCommand,

    tick: u64,
    decimation: u64,
    period: Duration,
    inference_budget: Option<Duration>,
    status_interval: u64,
    stats: CycleStats,
}

impl<P: PolicyPort, R: RobotIo> ControlLoop<P, R> {
    /// Build the loop. Every buffer used by [`tick`](Self::tick) is sized here.
    pub fn new(config: LoadedConfig, policy: P, io: R) -> Result<Self, ControlError> {
        let n = config.joint_count();
        let robot = &config.robot;
        if policy.actions_len() != n {
            return Err(ControlError::PolicyShape {
                expected: n,
                actual: policy.actions_len(),
            });
        }

        let assembler = ObservationAssembler::new(&config);
        let obs_len = robot.size.observations_size;
        let history = ObservationBuffer::new(robot.size.observations_history_length, obs_len);

        let this = Self {
            imu: ImuFrontEnd::new(robot.imu_orientation_offset),
            normalizer: Normalizer::new(robot, &config.default_pose),
            assembler,
            history,
            postprocessor: ActionPostprocessor::new(&config),
            pd: PdController::new(PdGains::from_config(&robot.control)),
            stand: StandModeController::new(&config),
            monitor: FaultMonitor::new(FaultLimits::from_runtime(&robot.runtime)),
            commands: None,
            stop: StopHandle::new(),
            frame: SensorFrame::zeros(n),
            have_frame: false,
            body: BodyImu::UPRIGHT,
            command: Command::default(),
            normalized: NormalizedState::zeros(n),
            observation: vec![0.0; obs_len],
            actions: vec![0.0; n],
            last_actions: vec![0.0; n],
            targets: config.default_pose.clone(),
            output: JointCommand::disabled(n),
            tick: 0,
            decimation: u64::from(robot.control.decimation),
            period: config.period,
            inference_budget: config.inference_budget(),
            status_interval: robot.runtime.status_interval,
            stats: CycleStats::new(),
            config,
            policy,
            io,
        };
        info!(
            "Control loop ready: {n} joints, {:.0} Hz, decimation {}, history {}x{}",
            this.config.robot.loop_frequency,
            this.decimation,
            this.history.capacity(),
            this.history.obs_len()
        );
        Ok(this)
    }

    /// Attach the external command handoff. Its stop flag becomes the
    /// loop's stop flag.
    pub fn with_commands(mut self, commands: CommandReceiver) -> Self {
        self.stop = commands.stop_handle();
        self.commands = Some(commands);
        self
    }

    /// Handle that stops the loop after the current tick.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    // ─── Accessors ──────────────────────────────────────────────────

    pub fn config(&self) -> &LoadedConfig {
        &self.config
    }

    #[inline]
    pub fn mode(&self) -> ControllerMode {
        self.stand.mode()
    }

    /// Index of the next tick.
    #[inline]
    pub fn tick_index(&self) -> u64 {
        self.tick
    }

    /// Current joint targets [rad].
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// Command emitted by the last tick.
    pub fn last_command(&self) -> &JointCommand {
        &self.output
    }

    /// Last applied clipped actions.
    pub fn last_actions(&self) -> &[f64] {
        &self.last_actions
    }

    pub fn history(&self) -> &ObservationBuffer {
        &self.history
    }

    pub fn stand(&self) -> &StandModeController {
        &self.stand
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn monitor(&self) -> &FaultMonitor {
        &self.monitor
    }

    /// Navigation command currently folded into the observation.
    pub fn command(&self) -> Command {
        self.command
    }

    pub fn io(&self) -> &R {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut R {
        &mut self.io
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    // ─── Tick ───────────────────────────────────────────────────────

    /// Execute one tick. Never aborts midway.
    pub fn tick(&mut self) -> TickReport {
        let started = Instant::now();
        let tick = self.tick;
        let mut faults = ControlFaults::empty();
        let mut failed = false;
        let mut inferred = false;

        self.apply_commands();
        faults |= self.read_sensors(tick);

        if self.have_frame {
            self.observe(tick);

            let step = self
                .stand
                .step(&self.frame.joints.position, &mut self.targets);
            let policy_tick = tick % self.decimation == 0;
            if !matches!(step, StandStep::Blending(_)) && policy_tick {
                let (applied, flags) = self.run_policy(tick, started);
                inferred = applied;
                faults |= flags;
            }

            if self.monitor.is_halted() {
                self.output.halt();
            } else {
                self.pd.compute(
                    &self.targets,
                    &self.frame.joints.position,
                    &self.frame.joints.velocity,
                    &mut self.output.torque,
                );
                self.output.enable = true;
            }
            self.output.target.clone_from(&self.targets);
        } else {
            // No measured state to servo around.
            self.output.halt();
            failed = true;
        }

        match self.io.write_command(&self.output) {
            Ok(()) => self.monitor.actuator_ok(),
            Err(e) => {
                faults |= self.monitor.actuator_fault(tick, &e);
                failed = true;
            }
        }

        let elapsed = started.elapsed();
        if elapsed > self.period {
            self.stats.overruns += 1;
            faults |= self.monitor.tick_overrun(tick, elapsed, self.period);
        } else {
            self.monitor.tick_on_time();
        }
        self.stats.record(elapsed.as_nanos() as i64);
        if failed {
            self.stats.failed_ticks += 1;
        }

        if (tick + 1) % self.status_interval == 0 {
            self.log_status(tick);
        }
        self.tick += 1;

        TickReport {
            tick,
            mode: self.stand.mode(),
            inferred,
            faults,
            failed,
            safety: self.monitor.safety_state(faults),
        }
    }

    fn apply_commands(&mut self) {
        let Some(rx) = &self.commands else {
            return;
        };
        let cmds = rx.drain();
        if let Some(v) = cmds.velocity {
            self.command = v;
        }
        if cmds.force_stand {
            self.force_standing("external request");
        }
        if cmds.stop {
            self.stop.request();
        }
    }

    /// Re-enter Standing from the current measured pose.
    fn force_standing(&mut self, reason: &str) {
        let pose = self.have_frame.then_some(&self.frame.joints.position[..]);
        self.stand.force_standing(pose);
        info!("tick {}: entering Standing ({reason})", self.tick);
    }

    fn read_sensors(&mut self, tick: u64) -> ControlFaults {
        let all = self.frame.joints.position.len() * 3 + FRAME_NON_JOINT_SCALARS;
        let fresh = match self.io.read_sensors() {
            Ok(f) => f,
            Err(e) => return self.monitor.sensor_fault(tick, all, &e),
        };

        if !self.have_frame {
            if fresh.is_valid() && fresh.joints.position.len() == self.frame.joints.position.len() {
                self.frame = fresh;
                self.have_frame = true;
                self.monitor.sensor_ok();
                debug!("tick {tick}: first valid sensor frame");
                return ControlFaults::empty();
            }
            return self
                .monitor
                .sensor_fault(tick, all, "no valid frame received yet");
        }

        let held = self.frame.merge_finite(&fresh);
        if held == 0 {
            self.monitor.sensor_ok();
            ControlFaults::empty()
        } else {
            self.monitor.sensor_fault(tick, held, "non-finite values")
        }
    }

    /// Sensors → observation → history.
    fn observe(&mut self, tick: u64) {
        if let Some(body) = self.imu.process(&self.frame.imu) {
            self.body = body;
        }
        let raw = RawSignals {
            joint_pos: &self.frame.joints.position,
            joint_vel: &self.frame.joints.velocity,
            ang_vel: self.body.ang_vel,
            lin_vel: self.frame.base_lin_vel,
            gravity: self.body.gravity,
            command: self.command,
        };
        self.normalizer.normalize(&raw, &mut self.normalized);
        self.assembler
            .assemble(&self.normalized, &self.last_actions, tick, &mut self.observation);
        if let Err(e) = self.history.push(&self.observation) {
            error!("tick {tick}: observation rejected: {e}");
        }
    }

    /// Deadline-checked inference. Returns whether the result was applied.
    fn run_policy(&mut self, tick: u64, tick_started: Instant) -> (bool, ControlFaults) {
        let budget = self
            .inference_budget
            .unwrap_or_else(|| self.period.saturating_sub(tick_started.elapsed()));

        let t0 = Instant::now();
        let result = self.policy.infer(self.history.window(), &mut self.actions);
        let took = t0.elapsed();
        self.stats.record_inference(took.as_nanos() as i64);

        let miss = match result {
            Err(e) => Some(InferenceMiss::Failed(e)),
            Ok(()) if took > budget => Some(InferenceMiss::Late { took, budget }),
            Ok(()) => self
                .actions
                .iter()
                .position(|a| !a.is_finite())
                .map(InferenceMiss::NonFinite),
        };

        if let Some(miss) = miss {
            self.stats.inference_misses += 1;
            let flags = self.monitor.inference_miss(tick, &miss);
            if flags.contains(ControlFaults::INFERENCE_ESCALATED) {
                self.force_standing("inference misses");
            }
            return (false, flags);
        }

        self.postprocessor.apply(
            &mut self.actions,
            &self.frame.joints.position,
            &self.frame.joints.velocity,
            &mut self.targets,
        );
        self.last_actions.copy_from_slice(&self.actions);
        self.monitor.inference_ok();
        self.stats.inferences += 1;
        debug!("tick {tick}: inference applied in {}µs", took.as_micros());
        (true, ControlFaults::empty())
    }

    fn log_status(&self, tick: u64) {
        let totals = self.monitor.totals();
        info!(
            "tick {tick}: mode {:?}, safety {:?}, cycle avg {}µs max {}µs, inferences {}, misses {}, \
             sensor faults {}, actuator faults {}, overruns {}",
            self.stand.mode(),
            self.monitor.safety_state(ControlFaults::empty()),
            self.stats.avg_cycle_ns() / 1000,
            self.stats.max_cycle_ns / 1000,
            self.stats.inferences,
            self.stats.inference_misses,
            totals.sensor_faults,
            totals.actuator_faults,
            totals.overruns,
        );
    }

    /// Emit one disabled zero-torque command.
    pub fn shutdown(&mut self) {
        self.output.halt();
        if let Err(e) = self.io.write_command(&self.output) {
            error!("final disable command rejected: {e}");
        }
        info!(
            "Control loop stopped after {} ticks ({} overruns, {} failed)",
            self.tick, self.stats.overruns, self.stats.failed_ticks
        );
    }

    // ─── Loop ───────────────────────────────────────────────────────

    /// Run until stopped. Returns the number of ticks executed.
    pub fn run(&mut self) -> Result<u64, CycleError> {
        self.run_for(None)
    }

    /// Run until stopped or `max_ticks` ticks have executed.
    ///
    /// Always finishes with [`shutdown`](Self::shutdown).
    pub fn run_for(&mut self, max_ticks: Option<u64>) -> Result<u64, CycleError> {
        let start_tick = self.tick;
        info!("Entering control loop (period {}µs)", self.period.as_micros());

        #[cfg(feature = "rt")]
        let result = self.run_rt_loop(start_tick, max_ticks);

        #[cfg(not(feature = "rt"))]
        let result = self.run_sim_loop(start_tick, max_ticks);

        self.shutdown();
        result.map(|()| self.tick - start_tick)
    }

    fn should_continue(&self, start_tick: u64, max_ticks: Option<u64>) -> bool {
        !self.stop.is_requested() && max_ticks.is_none_or(|m| self.tick - start_tick < m)
    }

    /// RT loop using `clock_nanosleep(TIMER_ABSTIME)`.
    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, start_tick: u64, max_ticks: Option<u64>) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let period_ns = self.period.as_nanos() as i64;
        let mut next_wake =
            clock_gettime(clock).map_err(|e| CycleError::Clock(format!("clock_gettime: {e}")))?;

        while self.should_continue(start_tick, max_ticks) {
            let now =
                clock_gettime(clock).map_err(|e| CycleError::Clock(format!("clock_gettime: {e}")))?;
            self.stats
                .record_latency(timespec_diff_ns(&now, &next_wake).abs());

            self.tick();

            next_wake = timespec_add_ns(next_wake, period_ns);
            let end =
                clock_gettime(clock).map_err(|e| CycleError::Clock(format!("clock_gettime: {e}")))?;
            if timespec_diff_ns(&end, &next_wake) > period_ns {
                // More than a full period behind: resync instead of bursting.
                next_wake = end;
            }
            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }

    /// Loop paced with `std::thread::sleep` against absolute deadlines.
    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, start_tick: u64, max_ticks: Option<u64>) -> Result<(), CycleError> {
        let mut next_wake = Instant::now();

        while self.should_continue(start_tick, max_ticks) {
            let woke = Instant::now();
            self.stats
                .record_latency(woke.saturating_duration_since(next_wake).as_nanos() as i64);

            self.tick();

            next_wake += self.period;
            let now = Instant::now();
            if now.saturating_duration_since(next_wake) > self.period {
                next_wake = now;
            }
            if let Some(remaining) = next_wake.checked_duration_since(now) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

/// Add nanoseconds to a TimeSpec.
#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// Difference `a - b` in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
