//! Data preprocessing module
//!
//! The fitted feature transform that maps a raw applicant row onto the
//! numeric vector the classifier expects:
//! - Missing value imputation (numeric fill values, most frequent category)
//! - Feature scaling (Standard, MinMax, Robust, MaxAbs)
//! - One-hot encoding over a fixed category list
//!
//! Transforms are fitted once elsewhere, serialized to JSON and loaded
//! read-only at startup.

mod imputer;
mod scaler;
mod encoder;
mod pipeline;

pub use imputer::ImputeStrategy;
pub use scaler::{ScalerParams, ScalerType};
pub use encoder::OneHotEncoder;
pub use pipeline::{CategoricalColumn, FeatureTransform, NumericColumn, TransformConfig};

use serde::{Deserialize, Serialize};

/// One raw input row in column order; cells may be missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub numeric: Vec<Option<f64>>,
    pub categorical: Vec<Option<String>>,
}

impl RawRow {
    /// Row with every cell missing
    pub fn empty(n_numeric: usize, n_categorical: usize) -> Self {
        Self {
            numeric: vec![None; n_numeric],
            categorical: vec![None; n_categorical],
        }
    }
}
