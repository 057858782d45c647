//! Error types for the loan risk explainer

use thiserror::Error;

/// Result type alias for explainer operations
pub type Result<T> = std::result::Result<T, ExplainerError>;

/// Main error type for artifact loading, preprocessing, inference and explanation
#[derive(Error, Debug)]
pub enum ExplainerError {
    #[error("Artifact error: {path}: {reason}")]
    ArtifactError { path: String, reason: String },

    #[error("Schema mismatch: {what} has {actual} columns, expected {expected}")]
    SchemaMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Explanation error: {0}")]
    ExplanationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },
}

impl ExplainerError {
    /// Wrap any displayable failure as an error about the artifact at `path`
    pub fn artifact(path: impl AsRef<std::path::Path>, reason: impl std::fmt::Display) -> Self {
        ExplainerError::ArtifactError {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ExplainerError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for ExplainerError {
    fn from(err: polars::error::PolarsError) -> Self {
        ExplainerError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ExplainerError {
    fn from(err: serde_json::Error) -> Self {
        ExplainerError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for ExplainerError {
    fn from(err: toml::de::Error) -> Self {
        ExplainerError::ConfigError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ExplainerError {
    fn from(err: ndarray::ShapeError) -> Self {
        ExplainerError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
