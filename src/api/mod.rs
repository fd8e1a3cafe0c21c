//! Read API over the newest poll artifacts
//!
//! Endpoints:
//! - `GET /health`
//! - `GET /api/latest-poll?season=<int>`
//! - `GET /api/polls/:season`
//! - `GET /api/seasons`
//!
//! Failures are reported as `{"error": "..."}` with status 200 unless strict
//! status codes are enabled.

pub mod polls;
mod telemetry;

use crate::artifact::ArtifactLocator;
use crate::{Error, Result};

use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Json, Router};
use object_store::ObjectStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Origin allowed by CORS (the UI)
    pub ui_url: String,
    /// Map error payloads to 404/503/500 instead of 200
    pub strict_status_codes: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            ui_url: "http://localhost:3000".to_string(),
            strict_status_codes: false,
        }
    }
}

/// Shared API state
#[derive(Clone)]
pub struct ApiState {
    /// `None` when object storage is not configured
    pub locator: Option<ArtifactLocator>,
    pub strict_status_codes: bool,
}

impl ApiState {
    pub fn new(store: Option<Arc<dyn ObjectStore>>, config: &ApiConfig) -> Self {
        Self {
            locator: store.map(ArtifactLocator::cleansed_polls),
            strict_status_codes: config.strict_status_codes,
        }
    }
}

fn cors_layer(ui_url: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(ui_url.trim_end_matches('/'))
        .map_err(|e| Error::Config(format!("invalid UI_URL '{ui_url}': {e}")))?;

    // Credentials forbid wildcards, so methods and headers mirror the request
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Build the HTTP API router
pub fn build_http_router(state: ApiState, config: &ApiConfig) -> Result<Router> {
    use axum::middleware;

    Ok(Router::new()
        .route("/health", get(health_check))
        .route("/api/latest-poll", get(polls::latest_poll))
        .route("/api/polls/:season", get(polls::season_polls))
        .route("/api/seasons", get(polls::seasons))
        .with_state(state)
        .layer(middleware::from_fn(telemetry::http_observability_middleware))
        .layer(cors_layer(&config.ui_url)?))
}

/// Health check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}
