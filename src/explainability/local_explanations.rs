//! Local explanations (permutation-sampled Shapley values)

use crate::background::BackgroundSample;
use crate::error::{ExplainerError, Result};
use crate::model::Classifier;
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Feature contribution to a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    /// Feature index
    pub feature_index: usize,
    /// Feature name
    pub feature_name: String,
    /// Feature value for this instance (after preprocessing)
    pub feature_value: f64,
    /// Contribution to the predicted probability (SHAP value)
    pub contribution: f64,
}

/// Explanation of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    /// Expected model output over the background sample
    pub base_value: f64,
    /// Model output for the explained instance
    pub prediction: f64,
    /// Per-feature contributions, in feature order
    pub contributions: Vec<FeatureContribution>,
    /// Model rows evaluated to produce this explanation
    pub n_evaluations: usize,
}

impl Attribution {
    /// Get sum of contributions
    pub fn sum_contributions(&self) -> f64 {
        self.contributions.iter().map(|c| c.contribution).sum()
    }

    /// `prediction - (base_value + sum of contributions)`
    pub fn additivity_gap(&self) -> f64 {
        self.prediction - (self.base_value + self.sum_contributions())
    }

    /// Contributions by absolute value, descending
    pub fn sorted_contributions(&self) -> Vec<&FeatureContribution> {
        let mut sorted: Vec<&FeatureContribution> = self.contributions.iter().collect();
        sorted.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));
        sorted
    }
}

/// Attribution engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainerConfig {
    /// Model-row budget per explanation; sets how many permutations are walked
    /// from each background row (at least one)
    pub max_evaluations: usize,
    /// Base seed; background row `i` draws permutations from `seed + i`
    pub seed: u64,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 20_000,
            seed: 42,
        }
    }
}

impl ExplainerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_evaluations == 0 {
            return Err(ExplainerError::ConfigError(
                "explainer.max_evaluations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Model-agnostic Shapley value estimator.
///
/// For every background row the explainer walks random feature permutations,
/// switching features one at a time from the background value to the instance
/// value and crediting each feature with the change in model output. Each
/// permutation is walked forwards and in reverse. Every walk telescopes from
/// `f(background row)` to `f(instance)`, so the averaged contributions add up
/// to `prediction - base_value`.
pub struct Explainer {
    model: Arc<dyn Classifier>,
    background: Array2<f64>,
    background_preds: Array1<f64>,
    base_value: f64,
    feature_names: Vec<String>,
    config: ExplainerConfig,
}

impl std::fmt::Debug for Explainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explainer")
            .field("model", &self.model.describe())
            .field("background_rows", &self.background.nrows())
            .field("base_value", &self.base_value)
            .field("config", &self.config)
            .finish()
    }
}

impl Explainer {
    /// Create an explainer; the background predictions are computed once here
    pub fn new(
        model: Arc<dyn Classifier>,
        background: &BackgroundSample,
        config: ExplainerConfig,
    ) -> Result<Self> {
        config.validate()?;
        if background.is_empty() {
            return Err(ExplainerError::ExplanationError(
                "background sample is empty".to_string(),
            ));
        }
        if background.width() != model.n_features() {
            return Err(ExplainerError::SchemaMismatch {
                what: "background sample".to_string(),
                expected: model.n_features(),
                actual: background.width(),
            });
        }

        let background_preds = model.predict_proba(&background.rows)?;
        let base_value = background_preds.mean().unwrap_or(0.0);
        let feature_names = if background.feature_names.is_empty() {
            (0..background.width()).map(|i| format!("feature_{}", i)).collect()
        } else {
            background.feature_names.clone()
        };

        Ok(Self {
            model,
            background: background.rows.clone(),
            background_preds,
            base_value,
            feature_names,
            config,
        })
    }

    /// Set feature names
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.n_features() {
            return Err(ExplainerError::SchemaMismatch {
                what: "feature names".to_string(),
                expected: self.n_features(),
                actual: names.len(),
            });
        }
        self.feature_names = names;
        Ok(self)
    }

    pub fn n_features(&self) -> usize {
        self.background.ncols()
    }

    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    pub fn background_size(&self) -> usize {
        self.background.nrows()
    }

    pub fn config(&self) -> &ExplainerConfig {
        &self.config
    }

    /// Permutations walked (forwards and reversed) per background row
    pub fn rounds(&self) -> usize {
        let per_round = 2 * self.background.nrows() * self.n_features();
        (self.config.max_evaluations / per_round.max(1)).max(1)
    }

    /// Explain a single preprocessed instance
    pub fn explain(&self, instance: &Array1<f64>) -> Result<Attribution> {
        let d = self.n_features();
        if instance.len() != d {
            return Err(ExplainerError::SchemaMismatch {
                what: "explained instance".to_string(),
                expected: d,
                actual: instance.len(),
            });
        }

        let start = Instant::now();
        let prediction = self.model.predict_one(instance)?;
        let rounds = self.rounds();

        let per_row: Vec<Vec<f64>> = (0..self.background.nrows())
            .into_par_iter()
            .map(|i| self.walk_background_row(i, instance.view(), prediction, rounds))
            .collect::<Result<_>>()?;

        let n_walks = (per_row.len() * rounds * 2) as f64;
        let mut totals = vec![0.0; d];
        for row in &per_row {
            for (t, c) in totals.iter_mut().zip(row) {
                *t += c;
            }
        }

        let contributions = totals
            .into_iter()
            .enumerate()
            .map(|(idx, total)| FeatureContribution {
                feature_index: idx,
                feature_name: self.feature_names[idx].clone(),
                feature_value: instance[idx],
                contribution: total / n_walks,
            })
            .collect();

        let attribution = Attribution {
            base_value: self.base_value,
            prediction,
            contributions,
            n_evaluations: per_row.len() * rounds * 2 * d.saturating_sub(1),
        };
        debug!(
            rounds,
            evaluations = attribution.n_evaluations,
            gap = attribution.additivity_gap(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Computed attribution"
        );
        Ok(attribution)
    }

    /// Summed marginal contributions of every walk starting at background row `i`
    fn walk_background_row(
        &self,
        i: usize,
        instance: ArrayView1<f64>,
        prediction: f64,
        rounds: usize,
    ) -> Result<Vec<f64>> {
        let d = self.n_features();
        let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(i as u64));
        let start_row = self.background.row(i);
        let start_pred = self.background_preds[i];
        let mut acc = vec![0.0; d];

        let mut perm: Vec<usize> = (0..d).collect();
        for _ in 0..rounds {
            perm.shuffle(&mut rng);
            let reversed: Vec<usize> = perm.iter().rev().copied().collect();
            for order in [&perm, &reversed] {
                let outputs = self.walk(start_row, instance, order)?;
                let mut before = start_pred;
                for (step, &feature) in order.iter().enumerate() {
                    // endpoints are pinned to the exact cached predictions
                    let after = if step + 1 == d { prediction } else { outputs[step] };
                    acc[feature] += after - before;
                    before = after;
                }
            }
        }
        Ok(acc)
    }

    /// Model outputs for the intermediate coalitions of one walk: row `k` has
    /// the first `k + 1` features of `order` switched to the instance values.
    fn walk(
        &self,
        start: ArrayView1<f64>,
        instance: ArrayView1<f64>,
        order: &[usize],
    ) -> Result<Array1<f64>> {
        let d = order.len();
        let n_rows = d.saturating_sub(1);
        if n_rows == 0 {
            return Ok(Array1::zeros(0));
        }
        let mut batch = Array2::zeros((n_rows, d));
        let mut current = start.to_owned();
        for (step, &feature) in order.iter().take(n_rows).enumerate() {
            current[feature] = instance[feature];
            batch.row_mut(step).assign(&current);
        }
        self.model.predict_proba(&batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LogisticModel, ClassifierArtifact};
    use ndarray::array;

    /// Additive model so exact Shapley values are known
    struct Linear(Vec<f64>);

    impl Classifier for Linear {
        fn n_features(&self) -> usize {
            self.0.len()
        }

        fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
            Ok(x.dot(&Array1::from_vec(self.0.clone())))
        }

        fn describe(&self) -> String {
            "linear".to_string()
        }
    }

    fn background() -> BackgroundSample {
        let rows = Array2::from_shape_fn((10, 3), |(i, _)| i as f64);
        BackgroundSample::new(
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            rows,
            42,
        )
        .unwrap()
    }

    #[test]
    fn test_additive_model_gets_exact_values() {
        let model: Arc<dyn Classifier> = Arc::new(Linear(vec![1.0, 2.0, 3.0]));
        let explainer = Explainer::new(model, &background(), ExplainerConfig::default()).unwrap();

        let instance = array![1.0, 2.0, 3.0];
        let attribution = explainer.explain(&instance).unwrap();

        // background mean is 4.5 in every column
        assert!((attribution.base_value - 27.0).abs() < 1e-9);
        let expected = [1.0 * (1.0 - 4.5), 2.0 * (2.0 - 4.5), 3.0 * (3.0 - 4.5)];
        for (c, e) in attribution.contributions.iter().zip(expected) {
            assert!((c.contribution - e).abs() < 1e-9, "{} vs {}", c.contribution, e);
        }
        assert!(attribution.additivity_gap().abs() < 1e-9);
    }

    #[test]
    fn test_nonlinear_model_is_additive_and_deterministic() {
        let model = ClassifierArtifact::Logistic(LogisticModel::new(vec![0.8, -1.5, 0.3], -0.2));
        let model: Arc<dyn Classifier> = Arc::new(model);
        let sample = BackgroundSample::new(
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            Array2::from_shape_fn((20, 3), |(i, j)| ((i * 7 + j * 3) % 11) as f64 / 5.0 - 1.0),
            42,
        )
        .unwrap();
        let explainer = Explainer::new(model, &sample, ExplainerConfig::default()).unwrap();

        let instance = array![2.0, -1.0, 0.5];
        let a = explainer.explain(&instance).unwrap();
        let b = explainer.explain(&instance).unwrap();
        assert_eq!(a, b);
        assert!(a.additivity_gap().abs() < 1e-9);
        assert!(a.contributions[0].contribution > 0.0);
        assert!(a.contributions[1].contribution > 0.0);
    }

    #[test]
    fn test_rounds_respect_budget() {
        let model: Arc<dyn Classifier> = Arc::new(Linear(vec![1.0, 2.0, 3.0]));
        let config = ExplainerConfig { max_evaluations: 600, seed: 1 };
        let explainer = Explainer::new(model.clone(), &background(), config).unwrap();
        assert_eq!(explainer.rounds(), 10);

        let config = ExplainerConfig { max_evaluations: 1, seed: 1 };
        let explainer = Explainer::new(model, &background(), config).unwrap();
        assert_eq!(explainer.rounds(), 1);
    }

    #[test]
    fn test_width_mismatch_is_rejected() {
        let model: Arc<dyn Classifier> = Arc::new(Linear(vec![1.0, 2.0]));
        let err = Explainer::new(model, &background(), ExplainerConfig::default()).unwrap_err();
        assert!(matches!(err, ExplainerError::SchemaMismatch { .. }));

        let model: Arc<dyn Classifier> = Arc::new(Linear(vec![1.0, 2.0, 3.0]));
        let explainer = Explainer::new(model, &background(), ExplainerConfig::default()).unwrap();
        assert!(explainer.explain(&array![1.0]).is_err());
    }

    #[test]
    fn test_sorted_contributions() {
        let contribution = |i: usize, name: &str, c: f64| FeatureContribution {
            feature_index: i,
            feature_name: name.to_string(),
            feature_value: 0.0,
            contribution: c,
        };
        let attribution = Attribution {
            base_value: 0.0,
            prediction: 0.0,
            contributions: vec![
                contribution(0, "a", 1.0),
                contribution(1, "b", -3.0),
                contribution(2, "c", 2.0),
            ],
            n_evaluations: 0,
        };

        let sorted = attribution.sorted_contributions();
        assert_eq!(sorted[0].feature_index, 1); // -3.0 has highest abs
        assert_eq!(sorted[1].feature_index, 2);
        assert_eq!(sorted[2].feature_index, 0);
    }
}
