//! Record -> prediction -> explanation pipeline
//!
//! [`ExplainContext`] bundles the loaded artifacts. It is built once before
//! the server starts and shared read-only across requests.

mod policy;
mod ranking;

pub use policy::{ConfidenceBand, Decision, DecisionPolicy};
pub use ranking::{rank_factors, RankedFactors, TOP_FACTORS};

use crate::artifacts::Artifacts;
use crate::error::{ExplainerError, Result};
use crate::explainability::{Attribution, Explainer, ExplainerConfig};
use crate::model::Classifier;
use crate::preprocessing::FeatureTransform;
use crate::record::ApplicantRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Everything the pipeline produces for one applicant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub record: ApplicantRecord,
    /// Probability of default
    pub probability: f64,
    pub predicted_class: u8,
    pub decision: Decision,
    pub confidence: f64,
    pub band: ConfidenceBand,
    pub attribution: Attribution,
    pub factors: RankedFactors,
    pub elapsed_ms: f64,
}

/// Loaded artifacts plus decision policy
pub struct ExplainContext {
    model: Arc<dyn Classifier>,
    transform: FeatureTransform,
    feature_names: Vec<String>,
    explainer: Explainer,
    policy: DecisionPolicy,
}

impl std::fmt::Debug for ExplainContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplainContext")
            .field("model", &self.model.describe())
            .field("features", &self.feature_names.len())
            .field("explainer", &self.explainer)
            .field("policy", &self.policy)
            .finish()
    }
}

impl ExplainContext {
    pub fn new(
        artifacts: Artifacts,
        explainer_config: ExplainerConfig,
        policy: DecisionPolicy,
    ) -> Result<Self> {
        policy.validate()?;
        let Artifacts {
            model,
            transform,
            feature_names,
            background,
        } = artifacts;

        let explainer = Explainer::new(model.clone(), &background, explainer_config)?
            .with_feature_names(feature_names.clone())?;

        info!(
            model = %model.describe(),
            features = feature_names.len(),
            background_rows = explainer.background_size(),
            base_value = explainer.base_value(),
            rounds = explainer.rounds(),
            "Explain context ready"
        );

        Ok(Self {
            model,
            transform,
            feature_names,
            explainer,
            policy,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    pub fn explainer(&self) -> &Explainer {
        &self.explainer
    }

    pub fn model_description(&self) -> String {
        self.model.describe()
    }

    /// Transform, predict, explain and rank one applicant
    pub fn assess(&self, record: &ApplicantRecord) -> Result<Assessment> {
        let start = Instant::now();

        let x = self.transform.transform_record(record)?;
        if x.len() != self.feature_names.len() {
            return Err(ExplainerError::SchemaMismatch {
                what: "transformed record".to_string(),
                expected: self.feature_names.len(),
                actual: x.len(),
            });
        }

        let attribution = self.explainer.explain(&x)?;
        let probability = attribution.prediction;
        let decision = self.policy.decide(probability);
        let confidence = self.policy.confidence(probability);
        let band = self.policy.band(confidence);
        let factors = rank_factors(&attribution, TOP_FACTORS);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        info!(
            probability,
            decision = decision.class(),
            band = %band,
            elapsed_ms,
            "Assessed applicant"
        );

        Ok(Assessment {
            record: record.clone(),
            probability,
            predicted_class: decision.class(),
            decision,
            confidence,
            band,
            attribution,
            factors,
            elapsed_ms,
        })
    }
}
