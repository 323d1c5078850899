//! Error handling
//!
//! Two layers, mirroring the pipeline boundary:
//! - [`PipelineError`] is the typed failure taxonomy inside the alert
//!   pipeline. Nothing propagates past the orchestrator untyped.
//! - [`AppError`] is the HTTP boundary type for handlers that surface
//!   failures as error responses (the alert-generation endpoint does not;
//!   its outcome object carries the failure as data).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Failure taxonomy for the alert-generation pipeline.
///
/// Display strings are the user-facing messages; the orchestrator converts
/// every variant into an outcome message verbatim.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// Malformed or missing input. Never reaches external services.
    #[error("{0}")]
    Validation(String),

    /// Required service configuration absent. Fails before any network I/O.
    #[error("{0}")]
    Configuration(String),

    /// Classification endpoint unreachable at the transport level.
    #[error("Could not connect to the analysis service. Please check your network connection and try again.")]
    AnalysisUnreachable,

    /// Classification service reachable but responded with a failure status.
    #[error("The analysis service returned an error (status {0}). Please try again.")]
    AnalysisStatus(u16),

    /// Classification service responded with an empty body.
    #[error("The analysis service returned an empty response.")]
    AnalysisEmptyResponse,

    /// Classification response did not match the expected envelope.
    #[error("The analysis service returned an unexpected data structure.")]
    AnalysisUnexpectedShape,

    /// Model invocation or schema validation of its output failed.
    #[error("AI alert generation failed: {0}")]
    Generation(String),

    /// Mail delivery failed. Downgraded to a warning by the orchestrator.
    #[error("{0}")]
    Notification(String),
}

/// HTTP-surface errors for handlers that return error responses.
#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    ExternalServiceError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::ExternalServiceError(msg) => {
                tracing::error!("External service error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.as_str())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(msg) => AppError::ValidationError(msg),
            PipelineError::Configuration(msg) => AppError::ExternalServiceError(msg),
            other => AppError::ExternalServiceError(other.to_string()),
        }
    }
}
