//! Application configuration
//!
//! Loaded from an optional TOML file; every field has a default. Artifact
//! locations can be overridden from the environment:
//!
//! | Variable                  | Field                       |
//! |---------------------------|-----------------------------|
//! | `LOAN_MODEL_PATH`         | `artifacts.model`           |
//! | `LOAN_TRANSFORM_PATH`     | `artifacts.transform`       |
//! | `LOAN_FEATURE_NAMES_PATH` | `artifacts.feature_names`   |
//! | `LOAN_BACKGROUND_PATH`    | `artifacts.background`      |
//! | `LOAN_HISTORICAL_DATA`    | `artifacts.historical_data` |

use crate::artifacts::ArtifactPaths;
use crate::background::SamplerConfig;
use crate::error::{ExplainerError, Result};
use crate::explainability::ExplainerConfig;
use crate::pipeline::DecisionPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub artifacts: ArtifactPaths,
    pub explainer: ExplainerConfig,
    pub policy: DecisionPolicy,
    pub sampler: SamplerConfig,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read the file (if any), apply environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    ExplainerError::ConfigError(format!("{}: {}", path.display(), e))
                })?;
                let config = Self::from_toml_str(&text)?;
                debug!(path = %path.display(), "Loaded configuration file");
                config
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply artifact path overrides from `lookup` (the environment in production)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        if let Some(p) = get("LOAN_MODEL_PATH") {
            self.artifacts.model = p;
        }
        if let Some(p) = get("LOAN_TRANSFORM_PATH") {
            self.artifacts.transform = p;
        }
        if let Some(p) = get("LOAN_FEATURE_NAMES_PATH") {
            self.artifacts.feature_names = p;
        }
        if let Some(p) = get("LOAN_BACKGROUND_PATH") {
            self.artifacts.background = Some(p);
        }
        if let Some(p) = get("LOAN_HISTORICAL_DATA") {
            self.artifacts.historical_data = Some(p);
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.explainer.validate()?;
        self.policy.validate()?;
        self.sampler.validate()?;
        Ok(())
    }
}
