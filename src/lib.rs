//! Loan Risk Explainer - loan default prediction with feature attributions
//!
//! Loads a pre-trained binary classifier together with its fitted feature
//! transform and a background sample, scores one applicant at a time, and
//! explains each score with permutation-based Shapley values.
//!
//! # Modules
//!
//! ## Inputs
//! - [`record`] - Applicant record, field metadata and form parsing
//! - [`preprocessing`] - Fitted imputation, scaling and one-hot encoding
//! - [`artifacts`] - Loading and cross-checking the startup artifacts
//! - [`config`] - TOML configuration with environment overrides
//!
//! ## Model and explanation
//! - [`model`] - Classifier artifacts (logistic, dense neural network)
//! - [`background`] - Background sample and its reconstruction from data
//! - [`synthetic`] - SMOTE oversampling for the balanced background
//! - [`explainability`] - Permutation Shapley attribution
//!
//! ## Output
//! - [`pipeline`] - Decision policy, confidence bands, factor ranking
//! - [`report`] - Text report and waterfall chart
//!
//! ## Services
//! - [`server`] - Web form and JSON API
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Inputs
pub mod record;
pub mod preprocessing;
pub mod artifacts;
pub mod config;

// Model and explanation
pub mod model;
pub mod background;
pub mod synthetic;
pub mod explainability;

// Output
pub mod pipeline;
pub mod report;

// Services
pub mod server;
pub mod cli;

pub use error::{ExplainerError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{ExplainerError, Result};

    // Inputs
    pub use crate::record::{ApplicantForm, ApplicantRecord, Job, Reason};
    pub use crate::preprocessing::{FeatureTransform, RawRow, TransformConfig};
    pub use crate::artifacts::{load_artifacts, ArtifactPaths, Artifacts};
    pub use crate::config::AppConfig;

    // Model and explanation
    pub use crate::model::{Classifier, ClassifierArtifact};
    pub use crate::background::{BackgroundSample, BackgroundSampler, HistoricalDataset, SamplerConfig};
    pub use crate::synthetic::{Sampler, SMOTE};
    pub use crate::explainability::{Attribution, Explainer, ExplainerConfig, FeatureContribution};

    // Output
    pub use crate::pipeline::{
        rank_factors, Assessment, ConfidenceBand, Decision, DecisionPolicy, ExplainContext,
        RankedFactors,
    };
    pub use crate::report::{render_report_text, WaterfallChart};
}
