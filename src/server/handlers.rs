//! Request handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Form, Json,
};
use serde_json::json;
use tracing::warn;

use super::error::{Result, ServerError};
use super::page;
use super::state::AppState;
use crate::record::{ApplicantForm, ApplicantRecord, Job, Reason, CATEGORICAL_FIELDS, NUMERIC_FIELDS};
use crate::report::{render_report_text, REPORT_FILENAME};

// ============================================================================
// UI Handlers
// ============================================================================

pub async fn serve_index() -> Html<String> {
    let form = ApplicantForm::from(&ApplicantRecord::default());
    Html(page::render_form(&form, None))
}

/// Form submission: result page, or the form again with an error banner
pub async fn predict_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ApplicantForm>,
) -> impl IntoResponse {
    let record = match form.parse() {
        Ok(record) => record,
        Err(e) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(page::render_form(&form, Some(&e.to_string()))),
            );
        }
    };

    match state.assess(record).await {
        Ok(assessment) => (StatusCode::OK, Html(page::render_result(&form, &assessment))),
        Err(e) => {
            warn!(error = %e, "Assessment failed");
            (e.status(), Html(page::render_form(&form, Some(&e.public_message()))))
        }
    }
}

/// Form submission: the plain-text report as a download
pub async fn download_report(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ApplicantForm>,
) -> Result<impl IntoResponse> {
    let record = form.parse()?;
    let assessment = state.assess(record).await?;
    let disposition = format!("attachment; filename=\"{}\"", REPORT_FILENAME);
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        render_report_text(&assessment),
    ))
}

// ============================================================================
// JSON API Handlers
// ============================================================================

pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(record): Json<ApplicantRecord>,
) -> Result<Json<serde_json::Value>> {
    for (name, v) in NUMERIC_FIELDS.iter().map(|f| f.name).zip(record.numeric_values()) {
        if !v.is_finite() {
            return Err(ServerError::BadRequest(format!("{} must be a finite number", name)));
        }
    }
    let assessment = state.assess(record).await?;
    let report = render_report_text(&assessment);

    Ok(Json(json!({
        "success": true,
        "assessment": assessment,
        "report": report,
    })))
}

pub async fn get_schema(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let defaults = ApplicantRecord::default();
    let reasons: Vec<&str> = Reason::ALL.iter().map(|r| r.as_str()).collect();
    let jobs: Vec<&str> = Job::ALL.iter().map(|j| j.as_str()).collect();

    Json(json!({
        "numeric_fields": NUMERIC_FIELDS,
        "categorical_fields": [
            { "field": CATEGORICAL_FIELDS[0], "choices": reasons },
            { "field": CATEGORICAL_FIELDS[1], "choices": jobs },
        ],
        "defaults": defaults,
        "feature_names": state.context.feature_names(),
        "policy": state.context.policy(),
    }))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let explainer = state.context.explainer();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.context.model_description(),
        "features": state.context.feature_names().len(),
        "background_rows": explainer.background_size(),
        "base_value": explainer.base_value(),
        "uptime_secs": state.uptime_secs(),
    }))
}
