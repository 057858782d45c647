//! SMOTE (Synthetic Minority Over-sampling Technique)

use crate::error::{ExplainerError, Result};
use crate::synthetic::{class_counts, class_indices, ResampleResult, Sampler};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

/// Distance/index pair for the bounded max-heap; ties break on index so the
/// neighbour set is reproducible.
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0).then(self.1.cmp(&other.1))
    }
}

/// SMOTE oversampler.
///
/// Minority classes are grown to the majority class size by
/// interpolating between a randomly chosen sample and one of its `k` nearest
/// same-class neighbours. Original rows always come first in the output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SMOTE {
    k_neighbors: usize,
    seed: u64,
    target_counts: Option<BTreeMap<i64, usize>>,
}

impl SMOTE {
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
            target_counts: None,
        }
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(ai, bi)| (ai - bi).powi(2)).sum()
    }

    /// k nearest rows of `data` (by position in `rows`), excluding `self_pos`
    fn find_neighbors(&self, x: &Array2<f64>, rows: &[usize], self_pos: usize, k: usize) -> Vec<usize> {
        let point = x.row(rows[self_pos]);
        let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);

        for (pos, &row) in rows.iter().enumerate() {
            if pos == self_pos {
                continue;
            }
            let candidate = DistIdx(Self::squared_distance(point, x.row(row)), pos);
            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(top) = heap.peek() {
                if candidate < *top {
                    heap.pop();
                    heap.push(candidate);
                }
            }
        }

        heap.into_sorted_vec().into_iter().map(|DistIdx(_, pos)| pos).collect()
    }
}

impl Default for SMOTE {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for SMOTE {
    fn fit(&mut self, _x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        let counts = class_counts(y);
        if counts.len() < 2 {
            return Err(ExplainerError::DataError(
                "SMOTE needs at least 2 classes".to_string(),
            ));
        }

        let max_count = counts.values().copied().max().unwrap_or(0);
        let targets = counts
            .iter()
            .map(|(&class, &count)| (class, max_count.max(count)))
            .collect();

        self.target_counts = Some(targets);
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let targets = self
            .target_counts
            .as_ref()
            .ok_or_else(|| ExplainerError::DataError("SMOTE not fitted".to_string()))?;
        if x.nrows() != y.len() {
            return Err(ExplainerError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let indices = class_indices(y);
        let n_features = x.ncols();

        let mut synthetic: Vec<f64> = Vec::new();
        let mut synthetic_y: Vec<i64> = Vec::new();
        let mut n_synthetic = BTreeMap::new();

        for (&class, &target_count) in targets {
            let rows = indices.get(&class).map(Vec::as_slice).unwrap_or(&[]);
            let n_to_generate = target_count.saturating_sub(rows.len());
            n_synthetic.insert(class, n_to_generate);
            if n_to_generate == 0 {
                continue;
            }
            if rows.len() < 2 {
                return Err(ExplainerError::DataError(format!(
                    "class {} has {} sample(s); SMOTE needs at least 2",
                    class,
                    rows.len()
                )));
            }

            let k = self.k_neighbors.min(rows.len() - 1);
            let mut neighbor_cache: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

            for _ in 0..n_to_generate {
                let pos = rng.gen_range(0..rows.len());
                let neighbors = neighbor_cache
                    .entry(pos)
                    .or_insert_with(|| self.find_neighbors(x, rows, pos, k));
                let neighbor_pos = neighbors[rng.gen_range(0..neighbors.len())];
                let gap: f64 = rng.gen();

                let sample = x.row(rows[pos]);
                let neighbor = x.row(rows[neighbor_pos]);
                synthetic.extend(sample.iter().zip(neighbor.iter()).map(|(&p, &n)| p + gap * (n - p)));
                synthetic_y.push(class);
            }
        }

        let n_original = x.nrows();
        let n_total = n_original + synthetic_y.len();
        let result_x = Array2::from_shape_fn((n_total, n_features), |(i, j)| {
            if i < n_original {
                x[[i, j]]
            } else {
                synthetic[(i - n_original) * n_features + j]
            }
        });

        let mut all_y: Vec<i64> = y.to_vec();
        all_y.extend_from_slice(&synthetic_y);

        Ok(ResampleResult {
            x: result_x,
            y: Array1::from_vec(all_y),
            n_synthetic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced() -> (Array2<f64>, Array1<i64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            rows.extend([i as f64 * 0.1, 1.0 - i as f64 * 0.05]);
            labels.push(0);
        }
        for i in 0..8 {
            rows.extend([5.0 + i as f64, 5.0 - i as f64 * 0.5]);
            labels.push(1);
        }
        (Array2::from_shape_vec((48, 2), rows).unwrap(), Array1::from_vec(labels))
    }

    #[test]
    fn test_smote_balances_classes() {
        let (x, y) = imbalanced();
        let result = SMOTE::new().with_seed(42).fit_resample(&x, &y).unwrap();
        let counts = class_counts(&result.y);
        assert_eq!(counts[&0], 40);
        assert_eq!(counts[&1], 40);
        assert_eq!(result.n_synthetic[&1], 32);
        assert_eq!(result.x.nrows(), 80);
    }

    #[test]
    fn test_originals_come_first() {
        let (x, y) = imbalanced();
        let result = SMOTE::new().fit_resample(&x, &y).unwrap();
        assert_eq!(result.x.slice(ndarray::s![..48, ..]), x);
        assert_eq!(result.y.slice(ndarray::s![..48]), y);
    }

    #[test]
    fn test_synthetic_rows_lie_between_minority_samples() {
        let (x, y) = imbalanced();
        let result = SMOTE::new().fit_resample(&x, &y).unwrap();
        for row in result.x.rows().into_iter().skip(48) {
            assert!(row[0] >= 5.0 && row[0] <= 12.0);
            assert!(row[1] >= 1.5 && row[1] <= 5.0);
        }
    }

    #[test]
    fn test_same_seed_same_output() {
        let (x, y) = imbalanced();
        let a = SMOTE::new().with_seed(7).fit_resample(&x, &y).unwrap();
        let b = SMOTE::new().with_seed(7).fit_resample(&x, &y).unwrap();
        assert_eq!(a.x, b.x);
    }

    #[test]
    fn test_duplicate_rows_do_not_stall() {
        let x = Array2::from_shape_vec((5, 1), vec![0.0, 0.0, 0.0, 1.0, 1.0]).unwrap();
        let y = Array1::from_vec(vec![0, 0, 0, 1, 1]);
        let result = SMOTE::new().fit_resample(&x, &y).unwrap();
        assert_eq!(result.x.nrows(), 6);
        assert_eq!(result.x[[5, 0]], 1.0);
    }

    #[test]
    fn test_single_class_is_rejected() {
        let x = Array2::zeros((3, 2));
        let y = Array1::from_vec(vec![1, 1, 1]);
        assert!(SMOTE::new().fit_resample(&x, &y).is_err());
    }
}
