//! Logistic regression

use crate::error::{ExplainerError, Result};
use super::{check_input_width, check_output, sigmoid};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Fitted logistic regression: `p = sigmoid(x . coefficients + intercept)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self { coefficients, intercept }
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        check_input_width(x, self.n_features())?;
        let w = Array1::from_vec(self.coefficients.clone());
        let logits = x.dot(&w) + self.intercept;
        check_output(logits.mapv(sigmoid))
    }

    pub fn validate(&self) -> Result<()> {
        if self.coefficients.is_empty() {
            return Err(ExplainerError::InferenceError(
                "logistic model has no coefficients".to_string(),
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ExplainerError::InferenceError(
                "logistic model has non-finite parameters".to_string(),
            ));
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        format!("logistic regression ({} features)", self.n_features())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_predict_proba() {
        let model = LogisticModel::new(vec![1.0, -2.0], 0.5);
        let x = array![[0.0, 0.0], [1.0, 1.0], [10.0, 0.0]];
        let p = model.predict_proba(&x).unwrap();
        assert!((p[0] - sigmoid(0.5)).abs() < 1e-12);
        assert!((p[1] - sigmoid(-0.5)).abs() < 1e-12);
        assert!(p[2] > 0.99);
    }

    #[test]
    fn test_wrong_width_is_rejected() {
        let model = LogisticModel::new(vec![1.0, -2.0], 0.5);
        let x = array![[0.0, 0.0, 1.0]];
        assert!(matches!(
            model.predict_proba(&x),
            Err(ExplainerError::SchemaMismatch { expected: 2, actual: 3, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let model = LogisticModel::new(vec![f64::NAN], 0.0);
        assert!(model.validate().is_err());
    }
}
