//! Application state management

use crate::pipeline::{Assessment, ExplainContext};
use crate::record::ApplicantRecord;
use std::sync::Arc;

use super::error::{Result, ServerError};

/// Application state shared across handlers; read-only after startup
pub struct AppState {
    pub context: Arc<ExplainContext>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(context: ExplainContext) -> Self {
        Self {
            context: Arc::new(context),
            started_at: chrono::Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// Run the pipeline for one record on the blocking pool
    pub async fn assess(&self, record: ApplicantRecord) -> Result<Assessment> {
        let context = Arc::clone(&self.context);
        let assessment = tokio::task::spawn_blocking(move || context.assess(&record))
            .await
            .map_err(|e| ServerError::Internal(format!("assessment task failed: {}", e)))??;
        Ok(assessment)
    }
}
