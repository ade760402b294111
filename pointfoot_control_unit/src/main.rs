//! # Pointfoot Control Unit
//!
//! Fixed-frequency joint control loop for the pointfoot biped.
//!
//! Loads the tuning TOML, builds the encoder/actor policy from dense-model
//! JSON files (a zero policy when none are given), wires the simulated robot
//! through the hardware joint map, performs RT setup, and runs the loop until
//! Ctrl-C or the tick bound.

use clap::Parser;
use pointfoot_common::consts::DEFAULT_CONFIG_PATH;
use pointfoot_common::control_unit::command::{Command, ExternalCommand};
use pointfoot_control_unit::command::handoff::command_channel;
use pointfoot_control_unit::config::{LoadedConfig, load_config};
use pointfoot_control_unit::cycle::{ControlLoop, rt_setup};
use pointfoot_control_unit::error::ControlError;
use pointfoot_control_unit::io::robot::{JointMap, MappedIo};
use pointfoot_control_unit::io::sim::{SimParams, SimulatedRobot};
use pointfoot_control_unit::policy::latent::LatentPolicy;
use pointfoot_control_unit::policy::model::{DenseModel, InferenceModel, ZeroModel};
use pointfoot_control_unit::policy::port::PolicyError;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

type Stage = Box<dyn InferenceModel + Send>;

/// Pointfoot Control Unit: policy-driven joint control loop
#[derive(Parser, Debug)]
#[command(name = "pointfoot_control_unit")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Fixed-frequency joint control loop for a pointfoot biped")]
struct Args {
    /// Path to the tuning TOML.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Actor model (dense-model JSON). Zero policy when omitted.
    #[arg(long, value_name = "FILE")]
    policy: Option<PathBuf>,

    /// Encoder model (dense-model JSON). Zero latent when omitted.
    #[arg(long, value_name = "FILE")]
    encoder: Option<PathBuf>,

    /// Stop after this many ticks (default: run until Ctrl-C).
    #[arg(long)]
    ticks: Option<u64>,

    /// Initial velocity command: lin_vel_x lin_vel_y ang_vel_yaw.
    #[arg(long, num_args = 3, value_names = ["VX", "VY", "WZ"], allow_negative_numbers = true)]
    cmd_vel: Option<Vec<f64>>,

    /// CPU core to pin the RT thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // The config picks the log level, so load it before tracing is up and
    // report a failure afterwards.
    let loaded = load_config(&args.config);
    let level = match (&loaded, args.verbose) {
        (_, true) => Level::DEBUG,
        (Ok(cfg), false) => cfg
            .robot
            .runtime
            .log_level
            .as_directive()
            .parse()
            .unwrap_or(Level::INFO),
        (Err(_), false) => Level::INFO,
    };
    setup_tracing(&args, level);

    info!("Pointfoot Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = loaded
        .map_err(|e| Box::new(ControlError::from(e)) as Box<dyn std::error::Error>)
        .and_then(|cfg| run(&args, cfg));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Pointfoot Control Unit shutdown complete");
}

fn run(args: &Args, config: LoadedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let n = config.joint_count();
    info!(
        "Config OK: {} Hz, {n} joints, decimation {}, stand {} s",
        config.robot.loop_frequency,
        config.robot.control.decimation,
        config.robot.stand_mode.stand_duration,
    );

    let policy = build_policy(args, &config)?;

    let map = JointMap::new(config.robot.hardware.joint_order.as_deref(), n)
        .ok_or(ControlError::JointOrder)?;
    let sim = SimulatedRobot::new(
        n,
        SimParams {
            dt: config.period,
            ..SimParams::default()
        },
    );
    let io = MappedIo::new(sim, map);

    let (commands, receiver) = command_channel(16, config.robot.joystick.axis_scale);
    if let Some(&[x, y, yaw]) = args.cmd_vel.as_deref() {
        commands.send(ExternalCommand::Velocity(Command {
            lin_vel_x: x,
            lin_vel_y: y,
            ang_vel_yaw: yaw,
        }))?;
    }

    let stop = commands.stop_handle();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        stop.request();
    })?;

    rt_setup(args.cpu_core, args.rt_priority)?;

    let mut control = ControlLoop::new(config, policy, io)?.with_commands(receiver);
    let ticks = control.run_for(args.ticks)?;

    let stats = control.stats();
    info!(
        "Ran {ticks} ticks: cycle avg {}µs max {}µs σ {:.1}µs, latency max {}µs, \
         {} inferences, {} misses, {} overruns",
        stats.avg_cycle_ns() / 1000,
        stats.max_cycle_ns / 1000,
        stats.stddev_cycle_ns() / 1000.0,
        stats.max_latency_ns / 1000,
        stats.inferences,
        stats.inference_misses,
        stats.overruns,
    );
    if control.monitor().is_halted() {
        warn!("Loop ended in latched halt: {:?}", control.monitor().latched());
    }
    Ok(())
}

/// Build the encoder → actor policy. Missing model files fall back to
/// zero-output stages of the configured shape.
fn build_policy(args: &Args, config: &LoadedConfig) -> Result<LatentPolicy<Stage, Stage>, PolicyError> {
    let history = config.robot.history_input_len();
    let latent = config.robot.size.latent_size;
    let actions = config.robot.size.actions_size;

    let encoder: Stage = match (&args.encoder, latent) {
        (_, 0) => Box::new(ZeroModel::new(history, 0)),
        (Some(path), _) => Box::new(load_model(path)?),
        (None, _) => {
            warn!("No encoder given; latent is zero");
            Box::new(ZeroModel::new(history, latent))
        }
    };
    let actor: Stage = match &args.policy {
        Some(path) => Box::new(load_model(path)?),
        None => {
            warn!("No policy given; holding the default pose");
            Box::new(ZeroModel::new(history + latent, actions))
        }
    };
    LatentPolicy::for_config(config, encoder, actor)
}

fn load_model(path: &Path) -> Result<DenseModel, PolicyError> {
    let model = DenseModel::from_json_file(path)?;
    info!(
        "Loaded {} ({} layers, {} → {})",
        path.display(),
        model.layer_count(),
        model.input_len(),
        model.output_len()
    );
    Ok(model)
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args, level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
