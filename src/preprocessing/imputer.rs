//! Missing value imputation

use crate::error::{ExplainerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy used to choose a fill value while fitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Mean of observed values (numeric only)
    Mean,
    /// Median of observed values (numeric only)
    Median,
    /// Most frequent observed value; ties go to the smallest
    MostFrequent,
    /// Fixed numeric fill
    Constant(f64),
}

impl ImputeStrategy {
    /// Fill value for a numeric column
    pub fn numeric_fill(&self, column: &str, values: &[Option<f64>]) -> Result<f64> {
        let mut observed: Vec<f64> = values.iter().flatten().copied().collect();
        if let ImputeStrategy::Constant(v) = self {
            return Ok(*v);
        }
        if observed.is_empty() {
            return Err(ExplainerError::PreprocessingError(format!(
                "column {} has no observed values to impute from",
                column
            )));
        }

        let fill = match self {
            ImputeStrategy::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
            ImputeStrategy::Median => {
                observed.sort_by(|a, b| a.total_cmp(b));
                let mid = observed.len() / 2;
                if observed.len() % 2 == 0 {
                    (observed[mid - 1] + observed[mid]) / 2.0
                } else {
                    observed[mid]
                }
            }
            ImputeStrategy::MostFrequent => {
                let mut counts: BTreeMap<u64, (f64, usize)> = BTreeMap::new();
                for v in &observed {
                    counts.entry(v.to_bits()).or_insert((*v, 0)).1 += 1;
                }
                counts
                    .into_values()
                    .max_by(|a, b| a.1.cmp(&b.1).then(b.0.total_cmp(&a.0)))
                    .map(|(v, _)| v)
                    .unwrap_or(0.0)
            }
            ImputeStrategy::Constant(v) => *v,
        };
        Ok(fill)
    }

    /// Fill value for a categorical column; only `MostFrequent` applies
    pub fn categorical_fill(&self, column: &str, values: &[Option<String>]) -> Result<String> {
        if *self != ImputeStrategy::MostFrequent {
            return Err(ExplainerError::ConfigError(format!(
                "{:?} imputation is not defined for categorical column {}",
                self, column
            )));
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for v in values.iter().flatten() {
            *counts.entry(v.as_str()).or_insert(0) += 1;
        }
        // BTreeMap iterates in key order, so the first maximum is the smallest key
        let mut best: Option<(&str, usize)> = None;
        for (k, c) in counts {
            if best.map_or(true, |(_, bc)| c > bc) {
                best = Some((k, c));
            }
        }
        best.map(|(k, _)| k.to_string()).ok_or_else(|| {
            ExplainerError::PreprocessingError(format!(
                "column {} has no observed values to impute from",
                column
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_fill_ignores_missing() {
        let values = vec![Some(1.0), None, Some(5.0), Some(3.0), None];
        let fill = ImputeStrategy::Median.numeric_fill("x", &values).unwrap();
        assert_eq!(fill, 3.0);
    }

    #[test]
    fn test_mean_fill() {
        let values = vec![Some(1.0), Some(2.0), None, Some(6.0)];
        let fill = ImputeStrategy::Mean.numeric_fill("x", &values).unwrap();
        assert!((fill - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_missing_is_error() {
        let values = vec![None, None];
        assert!(ImputeStrategy::Median.numeric_fill("x", &values).is_err());
        assert_eq!(
            ImputeStrategy::Constant(7.0).numeric_fill("x", &values).unwrap(),
            7.0
        );
    }

    #[test]
    fn test_most_frequent_category_tie_breaks_to_smallest() {
        let values = vec![
            Some("Other".to_string()),
            Some("Mgr".to_string()),
            None,
            Some("Other".to_string()),
            Some("Mgr".to_string()),
        ];
        let fill = ImputeStrategy::MostFrequent.categorical_fill("JOB", &values).unwrap();
        assert_eq!(fill, "Mgr");
    }
}
