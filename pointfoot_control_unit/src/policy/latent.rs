//! Encoder → actor policy.
//!
//! The encoder reads the flattened history window and produces the latent
//! vector. The actor reads `history ++ latent` and produces actions. With a
//! zero-length latent the encoder is never run.
//!
//! Trained models expect the window grouped by term: all `H` angular
//! velocities, then all `H` gravity vectors, and so on through the gait
//! command. [`LatentPolicy::for_config`] takes the term widths from the
//! configured observation layout. A policy built with [`LatentPolicy::new`]
//! alone flattens whole observations oldest first.

use heapless::Vec as FixedVec;
use pointfoot_common::consts::MAX_OBSERVATION_TERMS;
use tracing::debug;

use super::model::InferenceModel;
use super::port::{PolicyError, PolicyPort};
use crate::config::LoadedConfig;
use crate::observation::buffer::Window;

#[derive(Debug)]
pub struct LatentPolicy<E, A> {
    encoder: E,
    actor: A,
    history_len: usize,
    latent_len: usize,
    actions_len: usize,
    /// Term widths of one observation; empty for whole-observation order.
    segments: FixedVec<usize, MAX_OBSERVATION_TERMS>,
    /// `history ++ latent`, allocated once.
    input: Vec<f64>,
}

impl<E: InferenceModel, A: InferenceModel> LatentPolicy<E, A> {
    /// Check every stage shape against the configured sizes.
    pub fn for_config(config: &LoadedConfig, encoder: E, actor: A) -> Result<Self, PolicyError> {
        let size = &config.robot.size;
        let segments = config.robot.observation.segments(config.joint_count());
        Self::new(
            encoder,
            actor,
            config.robot.history_input_len(),
            size.latent_size,
            size.actions_size,
        )?
        .with_segments(&segments)
    }

    /// Group the window by term using these per-observation widths.
    pub fn with_segments(mut self, segments: &[usize]) -> Result<Self, PolicyError> {
        let obs_len: usize = segments.iter().sum();
        if obs_len == 0 || self.history_len % obs_len != 0 {
            return Err(PolicyError::Shape(format!(
                "term widths sum to {obs_len}, history window has {}",
                self.history_len
            )));
        }
        self.segments = FixedVec::from_slice(segments).map_err(|_| {
            PolicyError::Shape(format!(
                "{} observation terms exceed {MAX_OBSERVATION_TERMS}",
                segments.len()
            ))
        })?;
        Ok(self)
    }

    /// Per-observation term widths used to flatten the window.
    pub fn segments(&self) -> &[usize] {
        &self.segments
    }

    pub fn new(
        encoder: E,
        actor: A,
        history_len: usize,
        latent_len: usize,
        actions_len: usize,
    ) -> Result<Self, PolicyError> {
        if latent_len > 0 {
            if encoder.input_len() != history_len {
                return Err(PolicyError::Shape(format!(
                    "encoder expects {} inputs, history window has {history_len}",
                    encoder.input_len()
                )));
            }
            if encoder.output_len() != latent_len {
                return Err(PolicyError::Shape(format!(
                    "encoder produces {} values, latent_size is {latent_len}",
                    encoder.output_len()
                )));
            }
        }
        if actor.input_len() != history_len + latent_len {
            return Err(PolicyError::Shape(format!(
                "actor expects {} inputs, history + latent is {}",
                actor.input_len(),
                history_len + latent_len
            )));
        }
        if actor.output_len() != actions_len {
            return Err(PolicyError::Shape(format!(
                "actor produces {} values, actions_size is {actions_len}",
                actor.output_len()
            )));
        }
        debug!("Policy stages: history {history_len}, latent {latent_len}, actions {actions_len}");
        Ok(Self {
            encoder,
            actor,
            history_len,
            latent_len,
            actions_len,
            segments: FixedVec::new(),
            input: vec![0.0; history_len + latent_len],
        })
    }

    /// Most recent latent vector.
    pub fn latent(&self) -> &[f64] {
        &self.input[self.history_len..]
    }
}

impl<E: InferenceModel, A: InferenceModel> PolicyPort for LatentPolicy<E, A> {
    fn actions_len(&self) -> usize {
        self.actions_len
    }

    fn infer(&mut self, history: Window<'_>, actions: &mut [f64]) -> Result<(), PolicyError> {
        if history.flat_len() != self.history_len {
            return Err(PolicyError::InputLength {
                expected: self.history_len,
                actual: history.flat_len(),
            });
        }
        if actions.len() != self.actions_len {
            return Err(PolicyError::OutputLength {
                expected: self.actions_len,
                actual: actions.len(),
            });
        }
        let (hist, latent) = self.input.split_at_mut(self.history_len);
        let written = if self.segments.is_empty() {
            history.flatten_into(hist)
        } else {
            history.flatten_by_term(&self.segments, hist)
        };
        if written != self.history_len {
            return Err(PolicyError::Shape(format!(
                "term widths {:?} do not match observation length {}",
                self.segments.as_slice(),
                history.obs_len()
            )));
        }
        if self.latent_len > 0 {
            self.encoder.run(hist, latent)?;
        }
        self.actor.run(&self.input, actions)
    }
}
