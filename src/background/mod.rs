//! Background (reference) sample for the attribution engine
//!
//! The sample is a fixed set of preprocessed rows. It is either loaded from a
//! persisted JSON artifact or rebuilt from the historical dataset with
//! [`BackgroundSampler`].

mod dataset;
mod sampler;

pub use dataset::HistoricalDataset;
pub use sampler::{BackgroundSampler, SamplerConfig};

use crate::error::{ExplainerError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// On-disk layout of a background sample
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BackgroundFile {
    #[serde(default)]
    feature_names: Vec<String>,
    rows: Vec<Vec<f64>>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    created_at: Option<String>,
}

/// Preprocessed reference rows, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BackgroundFile", into = "BackgroundFile")]
pub struct BackgroundSample {
    /// Column labels; empty when the artifact does not carry them
    pub feature_names: Vec<String>,
    pub rows: Array2<f64>,
    pub seed: Option<u64>,
    pub created_at: Option<String>,
}

impl TryFrom<BackgroundFile> for BackgroundSample {
    type Error = ExplainerError;

    fn try_from(file: BackgroundFile) -> Result<Self> {
        let n = file.rows.len();
        let width = file.rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some(bad) = file.rows.iter().find(|r| r.len() != width) {
            return Err(ExplainerError::SchemaMismatch {
                what: "background row".to_string(),
                expected: width,
                actual: bad.len(),
            });
        }
        let rows = Array2::from_shape_vec((n, width), file.rows.into_iter().flatten().collect())?;
        let sample = Self {
            feature_names: file.feature_names,
            rows,
            seed: file.seed,
            created_at: file.created_at,
        };
        sample.validate()?;
        Ok(sample)
    }
}

impl From<BackgroundSample> for BackgroundFile {
    fn from(sample: BackgroundSample) -> Self {
        Self {
            feature_names: sample.feature_names,
            rows: sample.rows.rows().into_iter().map(|r| r.to_vec()).collect(),
            seed: sample.seed,
            created_at: sample.created_at,
        }
    }
}

impl BackgroundSample {
    pub fn new(feature_names: Vec<String>, rows: Array2<f64>, seed: u64) -> Result<Self> {
        let sample = Self {
            feature_names,
            rows,
            seed: Some(seed),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        };
        sample.validate()?;
        Ok(sample)
    }

    pub fn len(&self) -> usize {
        self.rows.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.nrows() == 0
    }

    pub fn width(&self) -> usize {
        self.rows.ncols()
    }

    fn validate(&self) -> Result<()> {
        if self.is_empty() || self.width() == 0 {
            return Err(ExplainerError::DataError("background sample is empty".to_string()));
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != self.width() {
            return Err(ExplainerError::SchemaMismatch {
                what: "background feature names".to_string(),
                expected: self.width(),
                actual: self.feature_names.len(),
            });
        }
        if self.rows.iter().any(|v| !v.is_finite()) {
            return Err(ExplainerError::DataError(
                "background sample contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), rows = self.len(), "Saved background sample");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ExplainerError::artifact(path, e))?;
        serde_json::from_str(&json).map_err(|e| ExplainerError::artifact(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_save_load_round_trip() {
        let sample = BackgroundSample::new(
            vec!["a".to_string(), "b".to_string()],
            array![[0.0, 1.0], [2.5, -1.0], [0.1, 0.2]],
            42,
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("background.json");
        sample.save(&path).unwrap();
        assert_eq!(BackgroundSample::load(&path).unwrap(), sample);
    }

    #[test]
    fn test_names_are_optional() {
        let sample: BackgroundSample = serde_json::from_str(r#"{"rows": [[1.0, 2.0]]}"#).unwrap();
        assert_eq!(sample.width(), 2);
        assert!(sample.feature_names.is_empty());
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let res = serde_json::from_str::<BackgroundSample>(r#"{"rows": [[1.0, 2.0], [3.0]]}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_empty_sample_is_rejected() {
        let res = serde_json::from_str::<BackgroundSample>(r#"{"rows": []}"#);
        assert!(res.is_err());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("background.json");
        std::fs::write(&path, r#"{"rows": []}"#).unwrap();
        assert!(matches!(
            BackgroundSample::load(&path),
            Err(ExplainerError::ArtifactError { .. })
        ));
    }

    #[test]
    fn test_name_count_must_match_width() {
        let res = BackgroundSample::new(vec!["a".to_string()], array![[0.0, 1.0]], 1);
        assert!(matches!(res, Err(ExplainerError::SchemaMismatch { .. })));
    }
}
