//! Boundary between the control loop and the learned policy.

use thiserror::Error;

use crate::observation::buffer::Window;

/// Policy and model failures.
///
/// On the tick path every variant is treated the same way: the result is
/// discarded and the previous joint target is held.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy input length {actual} != expected {expected}")]
    InputLength { expected: usize, actual: usize },

    #[error("policy output length {actual} != expected {expected}")]
    OutputLength { expected: usize, actual: usize },

    #[error("model stage mismatch: {0}")]
    Shape(String),

    #[error("model evaluation failed: {0}")]
    Model(String),

    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model file: {0}")]
    Format(String),
}

/// Supplies actions for a full history window.
///
/// Called once every `decimation` ticks with exactly `H` entries. Must write
/// `actions_len()` values in joint order.
pub trait PolicyPort {
    /// Number of action values written by [`infer`](Self::infer).
    fn actions_len(&self) -> usize;

    fn infer(&mut self, history: Window<'_>, actions: &mut [f64]) -> Result<(), PolicyError>;
}

impl<P: PolicyPort + ?Sized> PolicyPort for Box<P> {
    fn actions_len(&self) -> usize {
        (**self).actions_len()
    }

    fn infer(&mut self, history: Window<'_>, actions: &mut [f64]) -> Result<(), PolicyError> {
        (**self).infer(history, actions)
    }
}
