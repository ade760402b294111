//! Tick-boundary command handoff.
//!
//! A bounded single-writer single-reader channel carries
//! [`ExternalCommand`]s into the control thread. The loop drains it once per
//! tick, before sensors are read, so a command never changes state mid-tick.
//! The stop request is a shared flag so signal handlers can raise it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use pointfoot_common::control_unit::command::{Command, ExternalCommand};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandoffError {
    #[error("command queue full")]
    Full,
    #[error("control loop gone")]
    Disconnected,
}

/// Create the handoff pair. `capacity` is clamped to at least 1.
pub fn command_channel(capacity: usize, axis_scale: f64) -> (CommandSender, CommandReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    let stop = StopHandle::new();
    (
        CommandSender {
            tx,
            stop: stop.clone(),
        },
        CommandReceiver {
            rx,
            axis_scale,
            stop,
        },
    )
}

/// Shared stop request, checked between ticks.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Writer side. Never blocks.
#[derive(Debug)]
pub struct CommandSender {
    tx: Sender<ExternalCommand>,
    stop: StopHandle,
}

impl CommandSender {
    /// Queue a command for the next tick boundary.
    ///
    /// `Stop` also raises the stop flag so it wins even on a full queue.
    pub fn send(&self, command: ExternalCommand) -> Result<(), HandoffError> {
        if command == ExternalCommand::Stop {
            self.stop.request();
        }
        self.tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => HandoffError::Full,
            TrySendError::Disconnected(_) => HandoffError::Disconnected,
        })
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

/// Everything requested since the previous tick boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickCommands {
    /// Latest navigation command, if one arrived.
    pub velocity: Option<Command>,
    pub force_stand: bool,
    pub stop: bool,
}

/// Reader side, owned by the control thread.
#[derive(Debug)]
pub struct CommandReceiver {
    rx: Receiver<ExternalCommand>,
    axis_scale: f64,
    stop: StopHandle,
}

impl CommandReceiver {
    /// Drain every queued command. Later velocity commands replace earlier
    /// ones.
    pub fn drain(&self) -> TickCommands {
        let mut out = TickCommands::default();
        while let Ok(cmd) = self.rx.try_recv() {
            debug!("Command received: {cmd:?}");
            match cmd {
                ExternalCommand::Velocity(c) => out.velocity = Some(c.sanitized()),
                ExternalCommand::Joystick { axes } => {
                    out.velocity = Some(Command::from_joystick(axes, self.axis_scale).sanitized());
                }
                ExternalCommand::ForceStand => out.force_stand = true,
                ExternalCommand::Stop => out.stop = true,
            }
        }
        out.stop |= self.stop.is_requested();
        out
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}
