//! Fitted feature transform: impute, scale, one-hot encode

use crate::error::{ExplainerError, Result};
use crate::record::{ApplicantRecord, CATEGORICAL_FIELDS, NUMERIC_FIELDS};
use super::{
    encoder::OneHotEncoder,
    imputer::ImputeStrategy,
    scaler::{ScalerParams, ScalerType},
    RawRow,
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Fitting options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    pub scaler_type: ScalerType,
    pub numeric_impute_strategy: ImputeStrategy,
    pub categorical_impute_strategy: ImputeStrategy,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            scaler_type: ScalerType::Standard,
            numeric_impute_strategy: ImputeStrategy::Median,
            categorical_impute_strategy: ImputeStrategy::MostFrequent,
        }
    }
}

/// Numeric input column: imputed, then scaled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub fill_value: f64,
    #[serde(flatten)]
    pub scaler: ScalerParams,
}

/// Categorical input column: imputed, then one-hot encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub fill_value: String,
    #[serde(flatten)]
    pub encoder: OneHotEncoder,
}

/// Immutable mapping from a raw row to the model's feature vector.
///
/// Output layout: every numeric column in declared order, followed by one
/// indicator block per categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTransform {
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
}

impl FeatureTransform {
    /// Number of output features
    pub fn output_width(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|c| c.encoder.width()).sum::<usize>()
    }

    /// Output feature names derived from the column layout
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|c| c.name.clone()).collect();
        for col in &self.categorical {
            names.extend(col.encoder.feature_names(&col.name));
        }
        names
    }

    /// Transform one row
    pub fn transform_row(&self, row: &RawRow) -> Result<Array1<f64>> {
        let mut out = Array1::zeros(self.output_width());
        // Array1::zeros is contiguous
        let slice = out.as_slice_mut().ok_or_else(|| {
            ExplainerError::PreprocessingError("non-contiguous output buffer".to_string())
        })?;
        self.write_row(row, slice)?;
        Ok(out)
    }

    /// Transform many rows into an `n x output_width` matrix
    pub fn transform_rows(&self, rows: &[RawRow]) -> Result<Array2<f64>> {
        let width = self.output_width();
        let mut flat = vec![0.0; rows.len() * width];
        for (row, chunk) in rows.iter().zip(flat.chunks_mut(width.max(1))) {
            self.write_row(row, chunk)?;
        }
        Ok(Array2::from_shape_vec((rows.len(), width), flat)?)
    }

    /// Transform an applicant record
    pub fn transform_record(&self, record: &ApplicantRecord) -> Result<Array1<f64>> {
        self.transform_row(&record.to_raw_row())
    }

    fn write_row(&self, row: &RawRow, out: &mut [f64]) -> Result<()> {
        if row.numeric.len() != self.numeric.len() {
            return Err(ExplainerError::SchemaMismatch {
                what: "numeric input".to_string(),
                expected: self.numeric.len(),
                actual: row.numeric.len(),
            });
        }
        if row.categorical.len() != self.categorical.len() {
            return Err(ExplainerError::SchemaMismatch {
                what: "categorical input".to_string(),
                expected: self.categorical.len(),
                actual: row.categorical.len(),
            });
        }

        for (i, (col, cell)) in self.numeric.iter().zip(&row.numeric).enumerate() {
            let v = match cell {
                Some(v) if v.is_finite() => *v,
                _ => col.fill_value,
            };
            out[i] = col.scaler.apply(v);
        }

        let mut offset = self.numeric.len();
        for (col, cell) in self.categorical.iter().zip(&row.categorical) {
            let width = col.encoder.width();
            let value = cell.as_deref().unwrap_or(col.fill_value.as_str());
            col.encoder.encode_into(value, &mut out[offset..offset + width]);
            offset += width;
        }
        Ok(())
    }

    /// Check parameters and that the input columns match the applicant record layout
    pub fn validate(&self) -> Result<()> {
        let numeric: Vec<&str> = self.numeric.iter().map(|c| c.name.as_str()).collect();
        let expected_numeric: Vec<&str> = NUMERIC_FIELDS.iter().map(|f| f.name).collect();
        if numeric != expected_numeric {
            return Err(ExplainerError::PreprocessingError(format!(
                "numeric columns {:?} do not match applicant fields {:?}",
                numeric, expected_numeric
            )));
        }

        let categorical: Vec<&str> = self.categorical.iter().map(|c| c.name.as_str()).collect();
        let expected_categorical: Vec<&str> = CATEGORICAL_FIELDS.iter().map(|f| f.name).collect();
        if categorical != expected_categorical {
            return Err(ExplainerError::PreprocessingError(format!(
                "categorical columns {:?} do not match applicant fields {:?}",
                categorical, expected_categorical
            )));
        }

        for col in &self.numeric {
            col.scaler.validate(&col.name)?;
            if !col.fill_value.is_finite() {
                return Err(ExplainerError::PreprocessingError(format!(
                    "column {} has a non-finite fill value",
                    col.name
                )));
            }
        }
        for col in &self.categorical {
            col.encoder.validate(&col.name)?;
        }
        Ok(())
    }

    /// Fit a transform on historical rows whose columns follow the applicant layout
    pub fn fit(rows: &[RawRow], config: &TransformConfig) -> Result<Self> {
        if rows.is_empty() {
            return Err(ExplainerError::PreprocessingError(
                "cannot fit a transform on zero rows".to_string(),
            ));
        }

        let mut numeric = Vec::with_capacity(NUMERIC_FIELDS.len());
        for (i, spec) in NUMERIC_FIELDS.iter().enumerate() {
            let cells: Vec<Option<f64>> = rows
                .iter()
                .map(|r| r.numeric.get(i).copied().flatten().filter(|v| v.is_finite()))
                .collect();
            let fill_value = config.numeric_impute_strategy.numeric_fill(spec.name, &cells)?;
            let imputed: Vec<f64> = cells.iter().map(|c| c.unwrap_or(fill_value)).collect();
            let scaler = ScalerParams::fit(&config.scaler_type, &imputed)?;
            numeric.push(NumericColumn {
                name: spec.name.to_string(),
                fill_value,
                scaler,
            });
        }

        let mut categorical = Vec::with_capacity(CATEGORICAL_FIELDS.len());
        for (i, spec) in CATEGORICAL_FIELDS.iter().enumerate() {
            let cells: Vec<Option<String>> = rows
                .iter()
                .map(|r| r.categorical.get(i).cloned().flatten())
                .collect();
            let fill_value = config
                .categorical_impute_strategy
                .categorical_fill(spec.name, &cells)?;
            let encoder = OneHotEncoder::fit(spec.name, &cells)?;
            categorical.push(CategoricalColumn {
                name: spec.name.to_string(),
                fill_value,
                encoder,
            });
        }

        let transform = Self { numeric, categorical };
        debug!(
            rows = rows.len(),
            output_width = transform.output_width(),
            "Fitted feature transform"
        );
        Ok(transform)
    }

    /// Save the transform to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a transform from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ExplainerError::artifact(path, e))?;
        let transform: Self =
            serde_json::from_str(&json).map_err(|e| ExplainerError::artifact(path, e))?;
        transform
            .validate()
            .map_err(|e| ExplainerError::artifact(path, e))?;
        Ok(transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Job, Reason};

    fn historical_rows() -> Vec<RawRow> {
        let jobs = ["Mgr", "Office", "Other", "ProfExe", "Sales", "Self"];
        (0..30)
            .map(|i| {
                let x = i as f64;
                RawRow {
                    numeric: vec![
                        Some(5000.0 + 500.0 * x),
                        if i % 7 == 0 { None } else { Some(60000.0 + 1000.0 * x) },
                        Some(90000.0 + 1500.0 * x),
                        Some((i % 12) as f64),
                        Some((i % 3) as f64),
                        Some((i % 4) as f64),
                        Some(100.0 + 5.0 * x),
                        Some((i % 5) as f64),
                        Some(10.0 + (i % 20) as f64),
                        if i % 5 == 0 { None } else { Some(25.0 + x * 0.5) },
                    ],
                    categorical: vec![
                        if i % 9 == 0 {
                            None
                        } else if i % 3 == 0 {
                            Some("HomeImp".to_string())
                        } else {
                            Some("DebtCon".to_string())
                        },
                        Some(jobs[i % jobs.len()].to_string()),
                    ],
                }
            })
            .collect()
    }

    #[test]
    fn test_fit_produces_record_layout() {
        let transform = FeatureTransform::fit(&historical_rows(), &TransformConfig::default()).unwrap();
        transform.validate().unwrap();
        assert_eq!(transform.output_width(), 10 + 2 + 6);
        let names = transform.feature_names();
        assert_eq!(names[0], "LOAN");
        assert_eq!(names[10], "REASON_DebtCon");
        assert_eq!(names[17], "JOB_Self");
    }

    #[test]
    fn test_transform_record_length_matches_names() {
        let transform = FeatureTransform::fit(&historical_rows(), &TransformConfig::default()).unwrap();
        let mut record = ApplicantRecord::default();
        for job in Job::ALL {
            for reason in Reason::ALL {
                record.job = job;
                record.reason = reason;
                let v = transform.transform_record(&record).unwrap();
                assert_eq!(v.len(), transform.feature_names().len());
                // exactly one indicator per categorical block
                assert_eq!(v.slice(ndarray::s![10..12]).sum(), 1.0);
                assert_eq!(v.slice(ndarray::s![12..18]).sum(), 1.0);
            }
        }
    }

    #[test]
    fn test_missing_cells_use_fill_values() {
        let transform = FeatureTransform::fit(&historical_rows(), &TransformConfig::default()).unwrap();
        let row = RawRow::empty(10, 2);
        let v = transform.transform_row(&row).unwrap();
        for (i, col) in transform.numeric.iter().enumerate() {
            assert!((v[i] - col.scaler.apply(col.fill_value)).abs() < 1e-12);
        }
        // REASON falls back to its most frequent category
        assert_eq!(transform.categorical[0].fill_value, "DebtCon");
        assert_eq!(v[10], 1.0);
    }

    #[test]
    fn test_batch_matches_single_rows() {
        let rows = historical_rows();
        let transform = FeatureTransform::fit(&rows, &TransformConfig::default()).unwrap();
        let batch = transform.transform_rows(&rows[..5]).unwrap();
        for (i, row) in rows[..5].iter().enumerate() {
            let single = transform.transform_row(row).unwrap();
            assert_eq!(batch.row(i), single.view());
        }
    }

    #[test]
    fn test_wrong_row_shape_is_schema_error() {
        let transform = FeatureTransform::fit(&historical_rows(), &TransformConfig::default()).unwrap();
        let row = RawRow::empty(9, 2);
        assert!(matches!(
            transform.transform_row(&row),
            Err(ExplainerError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_save_load_preserves_output() {
        let transform = FeatureTransform::fit(&historical_rows(), &TransformConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocessor.json");
        transform.save(&path).unwrap();
        let loaded = FeatureTransform::load(&path).unwrap();
        let record = ApplicantRecord::default();
        assert_eq!(
            transform.transform_record(&record).unwrap(),
            loaded.transform_record(&record).unwrap()
        );
    }

    #[test]
    fn test_load_rejects_renamed_columns() {
        let mut transform = FeatureTransform::fit(&historical_rows(), &TransformConfig::default()).unwrap();
        transform.numeric[0].name = "AMOUNT".to_string();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocessor.json");
        transform.save(&path).unwrap();
        assert!(matches!(
            FeatureTransform::load(&path),
            Err(ExplainerError::ArtifactError { .. })
        ));
    }
}
