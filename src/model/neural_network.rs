//! Feed-forward neural network (inference only)
//!
//! Layers store their kernels as `n_in x n_out`, the layout dense layers are
//! usually exported in, so `a_next = act(a . W + b)`.

use crate::error::{ExplainerError, Result};
use super::{check_input_width, check_output, sigmoid};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Activation function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// Rectified Linear Unit
    Relu,
    /// Sigmoid
    Sigmoid,
    /// Hyperbolic tangent
    Tanh,
    /// Linear (identity)
    Linear,
}

impl Activation {
    fn apply(&self, z: Array2<f64>) -> Array2<f64> {
        match self {
            Activation::Relu => z.mapv_into(|v| v.max(0.0)),
            Activation::Sigmoid => z.mapv_into(sigmoid),
            Activation::Tanh => z.mapv_into(f64::tanh),
            Activation::Linear => z,
        }
    }
}

/// Serialized form of a dense layer: nested rows are easier to export and read
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DenseLayerSpec {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    activation: Activation,
}

/// Fully connected layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DenseLayerSpec", into = "DenseLayerSpec")]
pub struct DenseLayer {
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
    pub activation: Activation,
}

impl TryFrom<DenseLayerSpec> for DenseLayer {
    type Error = ExplainerError;

    fn try_from(spec: DenseLayerSpec) -> Result<Self> {
        let n_in = spec.weights.len();
        let n_out = spec.weights.first().map(|r| r.len()).unwrap_or(0);
        if n_in == 0 || n_out == 0 {
            return Err(ExplainerError::InferenceError("dense layer has no weights".to_string()));
        }
        if let Some(bad) = spec.weights.iter().find(|r| r.len() != n_out) {
            return Err(ExplainerError::ShapeError {
                expected: format!("{} weights per row", n_out),
                actual: format!("{} weights", bad.len()),
            });
        }
        if spec.bias.len() != n_out {
            return Err(ExplainerError::ShapeError {
                expected: format!("bias of length {}", n_out),
                actual: format!("length {}", spec.bias.len()),
            });
        }
        let flat: Vec<f64> = spec.weights.into_iter().flatten().collect();
        Ok(Self {
            weights: Array2::from_shape_vec((n_in, n_out), flat)?,
            bias: Array1::from_vec(spec.bias),
            activation: spec.activation,
        })
    }
}

impl From<DenseLayer> for DenseLayerSpec {
    fn from(layer: DenseLayer) -> Self {
        Self {
            weights: layer.weights.rows().into_iter().map(|r| r.to_vec()).collect(),
            bias: layer.bias.to_vec(),
            activation: layer.activation,
        }
    }
}

impl DenseLayer {
    pub fn n_in(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_out(&self) -> usize {
        self.weights.ncols()
    }

    fn forward(&self, a: &Array2<f64>) -> Array2<f64> {
        let z = a.dot(&self.weights) + &self.bias.view().insert_axis(Axis(0));
        self.activation.apply(z)
    }
}

/// Binary classification network ending in a single sigmoid unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralNetworkModel {
    pub layers: Vec<DenseLayer>,
}

impl NeuralNetworkModel {
    pub fn new(layers: Vec<DenseLayer>) -> Self {
        Self { layers }
    }

    pub fn n_features(&self) -> usize {
        self.layers.first().map(|l| l.n_in()).unwrap_or(0)
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        check_input_width(x, self.n_features())?;
        let mut a = x.to_owned();
        for layer in &self.layers {
            a = layer.forward(&a);
        }
        check_output(a.column(0).to_owned())
    }

    pub fn validate(&self) -> Result<()> {
        let last = self.layers.last().ok_or_else(|| {
            ExplainerError::InferenceError("network has no layers".to_string())
        })?;
        for pair in self.layers.windows(2) {
            if pair[0].n_out() != pair[1].n_in() {
                return Err(ExplainerError::ShapeError {
                    expected: format!("layer input of width {}", pair[0].n_out()),
                    actual: format!("width {}", pair[1].n_in()),
                });
            }
        }
        if last.n_out() != 1 || last.activation != Activation::Sigmoid {
            return Err(ExplainerError::InferenceError(
                "network must end in a single sigmoid output unit".to_string(),
            ));
        }
        let finite = self.layers.iter().all(|l| {
            l.weights.iter().all(|w| w.is_finite()) && l.bias.iter().all(|b| b.is_finite())
        });
        if !finite {
            return Err(ExplainerError::InferenceError(
                "network has non-finite parameters".to_string(),
            ));
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        let widths: Vec<String> = std::iter::once(self.n_features())
            .chain(self.layers.iter().map(|l| l.n_out()))
            .map(|w| w.to_string())
            .collect();
        format!("neural network ({})", widths.join(" -> "))
    }
}
