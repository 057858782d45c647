//! Ranking of the factors behind a prediction

use crate::explainability::{Attribution, FeatureContribution};
use serde::{Deserialize, Serialize};

/// Number of factors listed on each side
pub const TOP_FACTORS: usize = 5;

/// Factors that moved the prediction, split by direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFactors {
    /// Strictly positive contributions, largest first
    pub increasing: Vec<FeatureContribution>,
    /// Strictly negative contributions, most negative first
    pub reducing: Vec<FeatureContribution>,
    /// Feature with the largest contribution
    pub most_positive: Option<FeatureContribution>,
    /// Feature with the smallest contribution
    pub most_negative: Option<FeatureContribution>,
}

/// Rank `attribution` keeping at most `k` factors per direction.
///
/// Ties keep feature order.
pub fn rank_factors(attribution: &Attribution, k: usize) -> RankedFactors {
    let mut descending: Vec<&FeatureContribution> = attribution.contributions.iter().collect();
    descending.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));

    let mut ascending: Vec<&FeatureContribution> = attribution.contributions.iter().collect();
    ascending.sort_by(|a, b| a.contribution.total_cmp(&b.contribution));

    let increasing = descending
        .iter()
        .take(k)
        .filter(|c| c.contribution > 0.0)
        .map(|c| (*c).clone())
        .collect();
    let reducing = ascending
        .iter()
        .take(k)
        .filter(|c| c.contribution < 0.0)
        .map(|c| (*c).clone())
        .collect();

    RankedFactors {
        increasing,
        reducing,
        most_positive: descending.first().map(|c| (*c).clone()),
        most_negative: ascending.first().map(|c| (*c).clone()),
    }
}
