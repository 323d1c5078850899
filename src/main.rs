//! Edge Guardian Alert Server
//!
//! Backend for the Edge Guardian dashboard: takes an uploaded or captured
//! image plus a device location, classifies it against an external image
//! classifier, and — when an incident is detected — runs a tool-augmented
//! generation flow to produce a structured emergency alert, optionally
//! emailing the result.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    EDGE GUARDIAN SERVER                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────────────────────────────┐   │
//! │  │  API      │   │  Alert Pipeline                      │   │
//! │  │  (Axum)   ├──▶│  classify → decide → generate →      │   │
//! │  │           │   │  assemble → notify                   │   │
//! │  └───────────┘   └──────┬──────────────┬───────────┬────┘   │
//! │                         ▼              ▼           ▼        │
//! │                  Classification   Generation     SMTP       │
//! │                  API (Edge        API (chat +    transport  │
//! │                  Impulse)         tools)                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod logic;
mod models;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::{get, post}};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logic::classifier::HttpClassifier;
use logic::generation::client::GenerationClient;
use logic::generation::{AlertGenerator, LlmAlertGenerator};
use logic::notify::SmtpNotifier;
use logic::pipeline::AlertPipeline;

pub use error::{AppError, AppResult};

const HTTP_TIMEOUT_SECONDS: u64 = 60;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edge_guardian_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("Edge Guardian server starting...");
    match &config.classifier_url {
        Some(url) => tracing::info!("Classification endpoint: {}", url),
        None => tracing::warn!("EDGE_IMPULSE_API_URL is not set; alert generation will fail fast"),
    }

    let state = build_state(&config);

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");
    axum::serve(listener, app).await.expect("Server error");
}

/// Shared application state
///
/// Composition root: the long-lived HTTP client, generation client and mail
/// transport are created here once and injected into the pipeline. They are
/// read-only per request, so concurrent invocations share them freely.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AlertPipeline>,
    pub generator: Arc<dyn AlertGenerator>,
}

fn build_state(config: &config::Config) -> AppState {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECONDS))
        .build()
        .expect("Failed to create HTTP client");

    let generation_client = Arc::new(GenerationClient::new(
        config.generation_base_url.clone(),
        config.generation_api_key.clone(),
        config.generation_model.clone(),
        http_client.clone(),
    ));

    let classifier = Arc::new(HttpClassifier::new(
        config.classifier_url.clone(),
        http_client,
    ));
    let generator: Arc<dyn AlertGenerator> = Arc::new(LlmAlertGenerator::new(generation_client));
    let notifier = Arc::new(SmtpNotifier::new(config.smtp.clone()));

    AppState {
        pipeline: Arc::new(AlertPipeline::new(
            classifier,
            generator.clone(),
            notifier,
        )),
        generator,
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/alerts/generate", post(handlers::alerts::generate))
        .route("/api/v1/reports/summarize", post(handlers::reports::summarize))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
