//! Alert generation handler

use axum::{Json, extract::State};

use crate::AppState;
use crate::logic::pipeline::{AlertOutcome, GenerateAlertRequest};

/// Run the alert pipeline for an uploaded image.
///
/// Always responds 200: the outcome object carries the success flag and
/// message, matching the dashboard's form-state contract. Pipeline failures
/// are data here, not transport errors.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateAlertRequest>,
) -> Json<AlertOutcome> {
    Json(state.pipeline.run(request).await)
}
