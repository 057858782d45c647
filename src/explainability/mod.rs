//! Model explainability
//!
//! Post-hoc, model-agnostic attribution of a single prediction to its input
//! features, measured against a fixed background sample.

mod local_explanations;

pub use local_explanations::{Attribution, Explainer, ExplainerConfig, FeatureContribution};
