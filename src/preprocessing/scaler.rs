//! Feature scaling

use crate::error::{ExplainerError, Result};
use serde::{Deserialize, Serialize};

/// Type of scaler used when fitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// Robust scaling using median and IQR
    Robust,
    /// Max absolute scaling: x / max(|x|)
    MaxAbs,
    /// No scaling
    None,
}

/// Fitted parameters for one column: `(x - center) / scale`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub center: f64,
    pub scale: f64,
}

impl ScalerParams {
    pub fn identity() -> Self {
        Self { center: 0.0, scale: 1.0 }
    }

    #[inline]
    pub fn apply(&self, v: f64) -> f64 {
        (v - self.center) / self.scale
    }

    /// Fit on fully imputed values
    pub fn fit(scaler_type: &ScalerType, values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(ExplainerError::PreprocessingError(
                "cannot fit a scaler on an empty column".to_string(),
            ));
        }
        let n = values.len() as f64;

        let params = match scaler_type {
            ScalerType::Standard => {
                let mean = values.iter().sum::<f64>() / n;
                // population std, matching the common fitted-transform convention
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                Self { center: mean, scale: non_zero(var.sqrt()) }
            }
            ScalerType::MinMax => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                Self { center: min, scale: non_zero(max - min) }
            }
            ScalerType::Robust => {
                let mut sorted = values.to_vec();
                sorted.sort_by(|a, b| a.total_cmp(b));
                let median = quantile(&sorted, 0.5);
                let iqr = quantile(&sorted, 0.75) - quantile(&sorted, 0.25);
                Self { center: median, scale: non_zero(iqr) }
            }
            ScalerType::MaxAbs => {
                let max_abs = values.iter().fold(0.0f64, |a, b| a.max(b.abs()));
                Self { center: 0.0, scale: non_zero(max_abs) }
            }
            ScalerType::None => Self::identity(),
        };
        Ok(params)
    }

    pub fn validate(&self, column: &str) -> Result<()> {
        if !self.center.is_finite() || !self.scale.is_finite() || self.scale == 0.0 {
            return Err(ExplainerError::PreprocessingError(format!(
                "column {} has invalid scaler parameters (center={}, scale={})",
                column, self.center, self.scale
            )));
        }
        Ok(())
    }
}

fn non_zero(scale: f64) -> f64 {
    if scale == 0.0 {
        1.0
    } else {
        scale
    }
}

/// Linear-interpolated quantile of sorted values
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
