//! Reconstruction of the explainer's reference sample from historical data

use super::{BackgroundSample, HistoricalDataset};
use crate::error::{ExplainerError, Result};
use crate::preprocessing::FeatureTransform;
use crate::synthetic::{class_counts, Sampler, SMOTE};
use ndarray::{s, Array1};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Background sampling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Rows kept from the balanced training split
    pub background_size: usize,
    /// Fraction of labeled rows held out before balancing
    pub test_size: f64,
    /// Seed for the split shuffle and SMOTE
    pub seed: u64,
    /// SMOTE neighbourhood size
    pub k_neighbors: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            background_size: 100,
            test_size: 0.2,
            seed: 42,
            k_neighbors: 5,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.background_size == 0 {
            return Err(ExplainerError::ConfigError(
                "sampler.background_size must be at least 1".to_string(),
            ));
        }
        if !(self.test_size >= 0.0 && self.test_size < 1.0) {
            return Err(ExplainerError::ConfigError(format!(
                "sampler.test_size must be in [0, 1), got {}",
                self.test_size
            )));
        }
        if self.k_neighbors == 0 {
            return Err(ExplainerError::ConfigError(
                "sampler.k_neighbors must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Replays the training-time split and class balancing to recover the
/// reference rows the explainer compares against.
#[derive(Debug, Clone, Default)]
pub struct BackgroundSampler {
    config: SamplerConfig,
}

impl BackgroundSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Shuffled `(train, test)` index split over `n` rows; the first
    /// `ceil(test_size * n)` shuffled indices are held out.
    pub fn split_indices(&self, n: usize) -> (Vec<usize>, Vec<usize>) {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        indices.shuffle(&mut rng);

        let n_test = ((self.config.test_size * n as f64).ceil() as usize).min(n);
        let train = indices.split_off(n_test);
        (train, indices)
    }

    /// Build the background sample for `transform` from `dataset`
    pub fn sample(
        &self,
        dataset: &HistoricalDataset,
        transform: &FeatureTransform,
    ) -> Result<BackgroundSample> {
        self.config.validate()?;

        let (rows, labels) = dataset.labeled();
        if rows.is_empty() {
            return Err(ExplainerError::DataError(
                "historical dataset has no labeled rows".to_string(),
            ));
        }

        let (train_idx, test_idx) = self.split_indices(rows.len());
        let train_rows: Vec<_> = train_idx.iter().map(|&i| rows[i].clone()).collect();
        let train_y = Array1::from_iter(train_idx.iter().map(|&i| labels[i]));

        let x = transform.transform_rows(&train_rows)?;
        let balanced = SMOTE::new()
            .with_k_neighbors(self.config.k_neighbors)
            .with_seed(self.config.seed)
            .fit_resample(&x, &train_y)?;

        let keep = self.config.background_size.min(balanced.x.nrows());
        let sample = balanced.x.slice(s![..keep, ..]).to_owned();

        let counts = class_counts(&balanced.y);
        info!(
            labeled = rows.len(),
            train = train_idx.len(),
            test = test_idx.len(),
            balanced = balanced.x.nrows(),
            negatives = counts.get(&0).copied().unwrap_or(0),
            positives = counts.get(&1).copied().unwrap_or(0),
            kept = keep,
            "Built background sample"
        );

        BackgroundSample::new(transform.feature_names(), sample, self.config.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{RawRow, TransformConfig};
    use crate::record::ApplicantRecord;

    fn synthetic_dataset(n: usize) -> HistoricalDataset {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n {
            let mut record = ApplicantRecord::default();
            record.loan = 5000.0 + (i * 317 % 9000) as f64;
            record.debtinc = 20.0 + (i % 23) as f64;
            record.delinq = (i % 4) as f64;
            let mut row = record.to_raw_row();
            if i % 11 == 0 {
                row.numeric[9] = None;
            }
            rows.push(row);
            labels.push(if i % 13 == 0 { None } else { Some(i64::from(i % 5 == 0)) });
        }
        HistoricalDataset::new(rows, labels).unwrap()
    }

    fn fitted_transform(ds: &HistoricalDataset) -> FeatureTransform {
        let rows: Vec<RawRow> = ds.rows.clone();
        FeatureTransform::fit(&rows, &TransformConfig::default()).unwrap()
    }

    #[test]
    fn test_split_sizes() {
        let sampler = BackgroundSampler::default();
        let (train, test) = sampler.split_indices(101);
        assert_eq!(test.len(), 21);
        assert_eq!(train.len(), 80);

        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..101).collect::<Vec<_>>());
    }

    #[test]
    fn test_sample_shape_and_determinism() {
        let ds = synthetic_dataset(300);
        let transform = fitted_transform(&ds);
        let sampler = BackgroundSampler::default();

        let a = sampler.sample(&ds, &transform).unwrap();
        let b = sampler.sample(&ds, &transform).unwrap();
        assert_eq!(a.len(), 100);
        assert_eq!(a.width(), transform.output_width());
        assert_eq!(a.rows, b.rows);
        assert_eq!(a.feature_names, transform.feature_names());
    }

    #[test]
    fn test_first_rows_are_original_training_rows() {
        let ds = synthetic_dataset(300);
        let transform = fitted_transform(&ds);
        let sampler = BackgroundSampler::default();
        let sample = sampler.sample(&ds, &transform).unwrap();

        let (rows, _) = ds.labeled();
        let (train, _) = sampler.split_indices(rows.len());
        let first = transform.transform_row(&rows[train[0]]).unwrap();
        assert_eq!(sample.rows.row(0), first.view());
    }

    #[test]
    fn test_small_dataset_keeps_everything_balanced() {
        let ds = synthetic_dataset(60);
        let transform = fitted_transform(&ds);
        let sampler = BackgroundSampler::new(SamplerConfig {
            background_size: 1000,
            ..SamplerConfig::default()
        });
        let sample = sampler.sample(&ds, &transform).unwrap();
        assert!(sample.len() < 1000);
        assert!(sample.len() > 0);
    }

    #[test]
    fn test_unlabeled_dataset_is_rejected() {
        let ds = HistoricalDataset::new(vec![ApplicantRecord::default().to_raw_row()], vec![None]).unwrap();
        let transform = fitted_transform(&synthetic_dataset(50));
        assert!(BackgroundSampler::default().sample(&ds, &transform).is_err());
    }

    #[test]
    fn test_invalid_config() {
        let config = SamplerConfig {
            test_size: 1.5,
            ..SamplerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
