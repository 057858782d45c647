//! Categorical encoding

use crate::error::{ExplainerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One-hot encoder over a fixed, ordered category list.
///
/// Unknown categories encode as all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn new(categories: Vec<String>) -> Self {
        Self { categories }
    }

    /// Fit on observed values; categories are kept in sorted order
    pub fn fit(column: &str, values: &[Option<String>]) -> Result<Self> {
        let categories: BTreeSet<&str> = values.iter().flatten().map(|s| s.as_str()).collect();
        if categories.is_empty() {
            return Err(ExplainerError::PreprocessingError(format!(
                "column {} has no categories",
                column
            )));
        }
        Ok(Self::new(categories.into_iter().map(String::from).collect()))
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Write the indicator block for `value` into `out` (length `width()`)
    pub fn encode_into(&self, value: &str, out: &mut [f64]) {
        for (slot, category) in out.iter_mut().zip(&self.categories) {
            *slot = if category == value { 1.0 } else { 0.0 };
        }
    }

    /// Output column names, `{column}_{category}`
    pub fn feature_names(&self, column: &str) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{}", column, c))
            .collect()
    }

    pub fn validate(&self, column: &str) -> Result<()> {
        if self.categories.is_empty() {
            return Err(ExplainerError::PreprocessingError(format!(
                "column {} has an empty category list",
                column
            )));
        }
        let unique: BTreeSet<&String> = self.categories.iter().collect();
        if unique.len() != self.categories.len() {
            return Err(ExplainerError::PreprocessingError(format!(
                "column {} lists a category more than once",
                column
            )));
        }
        Ok(())
    }
}
