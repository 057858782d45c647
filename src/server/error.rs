//! Error types for the server

use crate::error::ExplainerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ExplainerError> for ServerError {
    fn from(err: ExplainerError) -> Self {
        match err {
            ExplainerError::InvalidInput { .. } => ServerError::BadRequest(err.to_string()),
            other => ServerError::Prediction(other.to_string()),
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) | ServerError::Json(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) | ServerError::Prediction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to the user
    pub fn public_message(&self) -> String {
        match self {
            ServerError::BadRequest(msg) => msg.clone(),
            ServerError::Internal(_) => "An internal error occurred".to_string(),
            ServerError::Prediction(_) => {
                "Prediction failed. Check server logs for details.".to_string()
            }
            ServerError::Json(_) => "Invalid JSON format".to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match &self {
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "Internal server error");
            }
            ServerError::Prediction(msg) => {
                tracing::error!(detail = %msg, "Prediction error");
            }
            _ => {}
        }

        let body = Json(json!({
            "error": true,
            "message": self.public_message(),
        }));

        (self.status(), body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
