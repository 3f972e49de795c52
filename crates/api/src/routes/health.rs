//! Health check endpoints.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Configured rate source.
    pub rate_source: &'static str,
    /// Currency pairs currently cached.
    pub cached_pairs: u64,
    /// Newest successful rate fetch, if any.
    pub last_rate_update: Option<DateTime<Utc>>,
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let resolver = state.converter.resolver();
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        rate_source: resolver.source_name(),
        cached_pairs: resolver.cached_pairs().await,
        last_rate_update: resolver.last_update_time(),
    })
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
