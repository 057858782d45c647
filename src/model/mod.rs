//! Pre-trained binary classifiers
//!
//! Models are trained elsewhere and exported to JSON. Two forms are
//! understood:
//! - logistic regression (`"type": "logistic"`)
//! - dense feed-forward network with a single sigmoid output unit
//!   (`"type": "neural_network"`)
//!
//! Everything downstream talks to the [`Classifier`] trait so tests and
//! alternative model families can be swapped in.

mod logistic;
mod neural_network;

pub use logistic::LogisticModel;
pub use neural_network::{Activation, DenseLayer, NeuralNetworkModel};

use crate::error::{ExplainerError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Binary classifier returning the probability of the positive class (default)
pub trait Classifier: Send + Sync {
    /// Width of the feature vectors the model accepts
    fn n_features(&self) -> usize;

    /// Probability of default for every row of `x`
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Short human-readable model description
    fn describe(&self) -> String;

    /// Probability for a single feature vector
    fn predict_one(&self, x: &Array1<f64>) -> Result<f64> {
        let batch = x.clone().insert_axis(Axis(0));
        let out = self.predict_proba(&batch)?;
        out.get(0).copied().ok_or_else(|| {
            ExplainerError::InferenceError("model returned no output".to_string())
        })
    }
}

/// Serialized classifier artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    Logistic(LogisticModel),
    NeuralNetwork(NeuralNetworkModel),
}

impl ClassifierArtifact {
    /// Load and validate a classifier from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ExplainerError::artifact(path, e))?;
        let model: Self =
            serde_json::from_str(&json).map_err(|e| ExplainerError::artifact(path, e))?;
        model.validate().map_err(|e| ExplainerError::artifact(path, e))?;
        Ok(model)
    }

    /// Save the classifier to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ClassifierArtifact::Logistic(m) => m.validate(),
            ClassifierArtifact::NeuralNetwork(m) => m.validate(),
        }
    }
}

impl Classifier for ClassifierArtifact {
    fn n_features(&self) -> usize {
        match self {
            ClassifierArtifact::Logistic(m) => m.n_features(),
            ClassifierArtifact::NeuralNetwork(m) => m.n_features(),
        }
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            ClassifierArtifact::Logistic(m) => m.predict_proba(x),
            ClassifierArtifact::NeuralNetwork(m) => m.predict_proba(x),
        }
    }

    fn describe(&self) -> String {
        match self {
            ClassifierArtifact::Logistic(m) => m.describe(),
            ClassifierArtifact::NeuralNetwork(m) => m.describe(),
        }
    }
}

/// Numerically stable logistic function
#[inline]
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Reject inputs whose width does not match the model
pub(crate) fn check_input_width(x: &Array2<f64>, expected: usize) -> Result<()> {
    if x.ncols() != expected {
        return Err(ExplainerError::SchemaMismatch {
            what: "model input".to_string(),
            expected,
            actual: x.ncols(),
        });
    }
    Ok(())
}

/// Reject non-finite model outputs
pub(crate) fn check_output(out: Array1<f64>) -> Result<Array1<f64>> {
    if let Some(bad) = out.iter().find(|p| !p.is_finite()) {
        return Err(ExplainerError::InferenceError(format!(
            "model produced a non-finite probability ({})",
            bad
        )));
    }
    Ok(out)
}
