//! API route definitions.

use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use forexa_shared::AppError;
use serde_json::json;

use crate::AppState;

pub mod conversion;
pub mod currencies;
pub mod diagnostics;
pub mod health;
pub mod rates;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(conversion::routes())
        .merge(rates::routes())
        .merge(currencies::routes())
        .merge(diagnostics::routes())
}

/// Fallback for unmatched paths.
pub async fn not_found(uri: Uri) -> Response {
    error_response(&AppError::NotFound(uri.path().to_string()))
}

/// Renders an `AppError` as `{ "error", "message" }` with its status code.
pub fn error_response(err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string()
        })),
    )
        .into_response()
}
