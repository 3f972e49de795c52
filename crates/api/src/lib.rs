//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Conversion and validation routes
//! - Exchange rate and currency listing routes
//! - Precision scenario and stress diagnostics
//! - JSON error responses derived from `AppError`

pub mod routes;

use axum::Router;
use forexa_core::currency::CurrencyConverter;
use forexa_core::stress::StressRunner;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Converter backed by the configured rate resolver.
    pub converter: Arc<CurrencyConverter>,
    /// Runner for on-demand stress runs.
    pub stress: Arc<StressRunner>,
    /// Cancelled when the server begins shutting down.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Creates state around `converter` and `stress`.
    #[must_use]
    pub fn new(
        converter: Arc<CurrencyConverter>,
        stress: StressRunner,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            converter,
            stress: Arc::new(stress),
            shutdown,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
