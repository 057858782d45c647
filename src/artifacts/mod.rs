//! Startup loading of the serialized artifacts
//!
//! All four artifacts are loaded and cross-checked before anything is served.
//! Any failure here is fatal.

use crate::background::{BackgroundSample, BackgroundSampler, HistoricalDataset, SamplerConfig};
use crate::error::{ExplainerError, Result};
use crate::model::{Classifier, ClassifierArtifact};
use crate::preprocessing::FeatureTransform;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

const DEFAULT_BACKGROUND_PATH: &str = "artifacts/background.json";

/// Artifact locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub transform: PathBuf,
    pub feature_names: PathBuf,
    /// Persisted background sample; takes precedence over `historical_data`.
    /// When neither is set, `artifacts/background.json` is loaded.
    pub background: Option<PathBuf>,
    /// Historical CSV used to rebuild the background sample
    pub historical_data: Option<PathBuf>,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            model: PathBuf::from("artifacts/best_model.json"),
            transform: PathBuf::from("artifacts/preprocessor.json"),
            feature_names: PathBuf::from("artifacts/feature_names.json"),
            background: None,
            historical_data: None,
        }
    }
}

impl ArtifactPaths {
    /// Conventional file names inside one directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join("best_model.json"),
            transform: dir.join("preprocessor.json"),
            feature_names: dir.join("feature_names.json"),
            background: Some(dir.join("background.json")),
            historical_data: None,
        }
    }

    /// The persisted background sample to load, or `None` when it is rebuilt
    /// from `historical_data`
    pub fn background_path(&self) -> Option<PathBuf> {
        match (&self.background, &self.historical_data) {
            (Some(path), _) => Some(path.clone()),
            (None, Some(_)) => None,
            (None, None) => Some(PathBuf::from(DEFAULT_BACKGROUND_PATH)),
        }
    }
}

/// The loaded, mutually consistent artifacts
pub struct Artifacts {
    pub model: Arc<dyn Classifier>,
    pub transform: FeatureTransform,
    pub feature_names: Vec<String>,
    pub background: BackgroundSample,
}

impl std::fmt::Debug for Artifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifacts")
            .field("model", &self.model.describe())
            .field("feature_names", &self.feature_names)
            .field("background_rows", &self.background.len())
            .finish()
    }
}

impl Artifacts {
    /// Cross-check widths; every component must agree with the transform
    pub fn validate(&self) -> Result<()> {
        let width = self.transform.output_width();
        let checks = [
            ("feature names", self.feature_names.len()),
            ("classifier input", self.model.n_features()),
            ("background sample", self.background.width()),
        ];
        for (what, actual) in checks {
            if actual != width {
                return Err(ExplainerError::SchemaMismatch {
                    what: what.to_string(),
                    expected: width,
                    actual,
                });
            }
        }
        if self.background.is_empty() {
            return Err(ExplainerError::DataError("background sample is empty".to_string()));
        }

        let derived = self.transform.feature_names();
        for (i, (given, expected)) in self.feature_names.iter().zip(&derived).enumerate() {
            if given != expected {
                warn!(index = i, given = %given, derived = %expected, "Feature name differs from transform output");
            }
        }
        Ok(())
    }
}

/// Read the ordered feature-name list (a JSON array of strings)
pub fn load_feature_names(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| ExplainerError::artifact(path, e))?;
    let names: Vec<String> =
        serde_json::from_str(&json).map_err(|e| ExplainerError::artifact(path, e))?;
    if names.is_empty() {
        return Err(ExplainerError::artifact(path, "feature name list is empty"));
    }
    Ok(names)
}

/// Load the background sample, rebuilding it from historical data when no
/// persisted sample is configured
pub fn load_background(
    paths: &ArtifactPaths,
    transform: &FeatureTransform,
    sampler: &SamplerConfig,
) -> Result<BackgroundSample> {
    match (paths.background_path(), &paths.historical_data) {
        (Some(path), _) => BackgroundSample::load(&path),
        (None, Some(csv)) => {
            info!(path = %csv.display(), "Rebuilding background sample from historical data");
            let dataset = HistoricalDataset::load_csv(csv)?;
            BackgroundSampler::new(sampler.clone()).sample(&dataset, transform)
        }
        (None, None) => Err(ExplainerError::ConfigError(
            "no background sample or historical dataset configured".to_string(),
        )),
    }
}

/// Load and validate every artifact
pub fn load_artifacts(paths: &ArtifactPaths, sampler: &SamplerConfig) -> Result<Artifacts> {
    let start = Instant::now();

    let model = ClassifierArtifact::load(&paths.model)?;
    info!(path = %paths.model.display(), model = %model.describe(), "Loaded classifier");

    let transform = FeatureTransform::load(&paths.transform)?;
    info!(path = %paths.transform.display(), width = transform.output_width(), "Loaded preprocessing transform");

    let feature_names = load_feature_names(&paths.feature_names)?;
    info!(path = %paths.feature_names.display(), count = feature_names.len(), "Loaded feature names");

    let background = load_background(paths, &transform, sampler)?;
    info!(rows = background.len(), width = background.width(), "Loaded background sample");

    let artifacts = Artifacts {
        model: Arc::new(model),
        transform,
        feature_names,
        background,
    };
    artifacts.validate()?;

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Artifacts ready");
    Ok(artifacts)
}
