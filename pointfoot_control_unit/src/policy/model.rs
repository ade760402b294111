//! Inference model stages.
//!
//! A model maps a fixed-length input to a fixed-length output. Buffers are
//! sized at construction; `run` never allocates.

use std::path::Path;

use nalgebra::{DMatrix, DVector};
use serde::Deserialize;
use tracing::debug;

use super::port::PolicyError;

/// One fixed-shape inference stage.
pub trait InferenceModel {
    fn input_len(&self) -> usize;
    fn output_len(&self) -> usize;
    fn run(&mut self, input: &[f64], output: &mut [f64]) -> Result<(), PolicyError>;
}

impl<M: InferenceModel + ?Sized> InferenceModel for Box<M> {
    fn input_len(&self) -> usize {
        (**self).input_len()
    }
    fn output_len(&self) -> usize {
        (**self).output_len()
    }
    fn run(&mut self, input: &[f64], output: &mut [f64]) -> Result<(), PolicyError> {
        (**self).run(input, output)
    }
}

fn check_lengths(
    model: &impl InferenceModel,
    input: &[f64],
    output: &[f64],
) -> Result<(), PolicyError> {
    if input.len() != model.input_len() {
        return Err(PolicyError::InputLength {
            expected: model.input_len(),
            actual: input.len(),
        });
    }
    if output.len() != model.output_len() {
        return Err(PolicyError::OutputLength {
            expected: model.output_len(),
            actual: output.len(),
        });
    }
    Ok(())
}

// ─── Zero Model ─────────────────────────────────────────────────────

/// Outputs zeros. Holds the robot at the default pose when used as actor.
#[derive(Debug, Clone, Copy)]
pub struct ZeroModel {
    input_len: usize,
    output_len: usize,
}

impl ZeroModel {
    pub const fn new(input_len: usize, output_len: usize) -> Self {
        Self {
            input_len,
            output_len,
        }
    }
}

impl InferenceModel for ZeroModel {
    fn input_len(&self) -> usize {
        self.input_len
    }
    fn output_len(&self) -> usize {
        self.output_len
    }
    fn run(&mut self, input: &[f64], output: &mut [f64]) -> Result<(), PolicyError> {
        check_lengths(&*self, input, output)?;
        output.iter_mut().for_each(|v| *v = 0.0);
        Ok(())
    }
}

// ─── Dense Model ────────────────────────────────────────────────────

/// Element-wise activation applied after a layer's affine map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Identity,
    Relu,
    Elu,
    Tanh,
}

impl Activation {
    #[inline]
    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Identity => x,
            Self::Relu => x.max(0.0),
            Self::Elu => {
                if x > 0.0 {
                    x
                } else {
                    x.exp_m1()
                }
            }
            Self::Tanh => x.tanh(),
        }
    }
}

/// `y = act(W x + b)`.
#[derive(Debug, Clone)]
pub struct DenseLayer {
    weights: DMatrix<f64>,
    bias: DVector<f64>,
    activation: Activation,
}

impl DenseLayer {
    pub fn new(
        weights: DMatrix<f64>,
        bias: DVector<f64>,
        activation: Activation,
    ) -> Result<Self, PolicyError> {
        if weights.nrows() == 0 || weights.ncols() == 0 {
            return Err(PolicyError::Format("layer has an empty weight matrix".into()));
        }
        if bias.len() != weights.nrows() {
            return Err(PolicyError::Format(format!(
                "bias length {} != {} weight rows",
                bias.len(),
                weights.nrows()
            )));
        }
        if !weights.iter().chain(bias.iter()).all(|v| v.is_finite()) {
            return Err(PolicyError::Format("layer contains non-finite parameters".into()));
        }
        Ok(Self {
            weights,
            bias,
            activation,
        })
    }

    #[inline]
    pub fn input_len(&self) -> usize {
        self.weights.ncols()
    }

    #[inline]
    pub fn output_len(&self) -> usize {
        self.weights.nrows()
    }

    fn forward(&self, x: &[f64], y: &mut [f64]) {
        for (i, (out, b)) in y.iter_mut().zip(self.bias.iter()).enumerate() {
            let dot: f64 = self
                .weights
                .row(i)
                .iter()
                .zip(x)
                .map(|(w, v)| w * v)
                .sum();
            *out = self.activation.apply(dot + b);
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DenseFile {
    layers: Vec<DenseLayerFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DenseLayerFile {
    /// Row-major `[out][in]`.
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    #[serde(default)]
    activation: Activation,
}

impl DenseLayerFile {
    fn into_layer(self, index: usize) -> Result<DenseLayer, PolicyError> {
        let rows = self.weights.len();
        let cols = self.weights.first().map_or(0, Vec::len);
        if self.weights.iter().any(|r| r.len() != cols) {
            return Err(PolicyError::Format(format!("layer {index}: ragged weight rows")));
        }
        let flat: Vec<f64> = self.weights.into_iter().flatten().collect();
        let weights = DMatrix::from_row_slice(rows, cols, &flat);
        DenseLayer::new(weights, DVector::from_vec(self.bias), self.activation)
            .map_err(|e| PolicyError::Format(format!("layer {index}: {e}")))
    }
}

/// Multi-layer perceptron with fixed ping-pong scratch buffers.
#[derive(Debug, Clone)]
pub struct DenseModel {
    layers: Vec<DenseLayer>,
    ping: Vec<f64>,
    pong: Vec<f64>,
}

impl DenseModel {
    /// Chain `layers`; each layer's input must match the previous output.
    pub fn from_layers(layers: Vec<DenseLayer>) -> Result<Self, PolicyError> {
        if layers.is_empty() {
            return Err(PolicyError::Format("model has no layers".into()));
        }
        for (k, pair) in layers.windows(2).enumerate() {
            if pair[0].output_len() != pair[1].input_len() {
                return Err(PolicyError::Format(format!(
                    "layer {} outputs {} values but layer {} expects {}",
                    k,
                    pair[0].output_len(),
                    k + 1,
                    pair[1].input_len()
                )));
            }
        }
        let hidden = layers
            .iter()
            .map(DenseLayer::output_len)
            .max()
            .unwrap_or(0);
        Ok(Self {
            layers,
            ping: vec![0.0; hidden],
            pong: vec![0.0; hidden],
        })
    }

    /// Parse `{"layers": [{"weights": [[..]], "bias": [..], "activation": ".."}]}`.
    pub fn from_json_str(text: &str) -> Result<Self, PolicyError> {
        let file: DenseFile =
            serde_json::from_str(text).map_err(|e| PolicyError::Format(e.to_string()))?;
        let layers = file
            .layers
            .into_iter()
            .enumerate()
            .map(|(k, l)| l.into_layer(k))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_layers(layers)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, PolicyError> {
        let text = std::fs::read_to_string(path)?;
        let model = Self::from_json_str(&text)?;
        debug!(
            "Loaded {}-layer model {} -> {} from {}",
            model.layers.len(),
            model.input_len(),
            model.output_len(),
            path.display()
        );
        Ok(model)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

impl InferenceModel for DenseModel {
    fn input_len(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_len)
    }

    fn output_len(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_len)
    }

    fn run(&mut self, input: &[f64], output: &mut [f64]) -> Result<(), PolicyError> {
        check_lengths(&*self, input, output)?;
        let Self { layers, ping, pong } = self;
        let (mut src, mut dst) = (ping, pong);
        let mut src_len = 0;
        let last = layers.len() - 1;
        for (k, layer) in layers.iter().enumerate() {
            let x: &[f64] = if k == 0 { input } else { &src[..src_len] };
            if k == last {
                layer.forward(x, output);
            } else {
                let n = layer.output_len();
                layer.forward(x, &mut dst[..n]);
                src_len = n;
                std::mem::swap(&mut src, &mut dst);
            }
        }
        Ok(())
    }
}
