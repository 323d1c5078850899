//! Incident report summarization handler

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    pub incident_report: String,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

/// Summarize a free-text incident report. Plain generation call, no tools.
pub async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> AppResult<Json<SummarizeResponse>> {
    if request.incident_report.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Incident report text is required.".to_string(),
        ));
    }

    let summary = state
        .generator
        .summarize_report(&request.incident_report)
        .await?;

    Ok(Json(SummarizeResponse { summary }))
}
