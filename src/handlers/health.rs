//! Health check handler

use axum::Json;
use serde_json::{Value, json};

/// Health check endpoint
pub async fn check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().timestamp()
    }))
}
