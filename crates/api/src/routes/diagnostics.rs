//! Precision scenario and stress diagnostics.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use forexa_core::currency::scenario::{ScenarioReport, catalog, run_scenarios};
use forexa_core::stress::{StressError, StressRequest};
use forexa_shared::AppError;
use serde::Deserialize;
use tracing::{info, warn};

use super::error_response;
use crate::AppState;

/// Largest batch accepted by `POST /stress`.
pub const MAX_STRESS_REQUESTS: usize = 10_000;

/// Creates the diagnostics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/scenarios", get(run_precision_scenarios))
        .route("/stress", post(run_stress))
}

/// Request body for a stress run.
#[derive(Debug, Deserialize)]
pub struct StressRunRequest {
    /// Number of conversions to perform.
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    1000
}

/// GET `/scenarios` - Run the standard precision catalog.
async fn run_precision_scenarios(State(state): State<AppState>) -> Json<ScenarioReport> {
    let report = run_scenarios(&state.converter, &catalog()).await;
    if report.all_passed() {
        info!(passed = report.passed, "Precision scenarios passed");
    } else {
        warn!(failed = report.failed, "Precision scenarios failed");
    }
    Json(report)
}

/// POST `/stress` - Run a deterministic sweep of conversions.
async fn run_stress(
    State(state): State<AppState>,
    payload: Result<Json<StressRunRequest>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected stress request body");
            return error_response(&AppError::Validation(
                "Stress request body must be a JSON object with a numeric count".to_string(),
            ));
        }
    };

    if body.count == 0 || body.count > MAX_STRESS_REQUESTS {
        return error_response(&AppError::Validation(format!(
            "Stress count must be between 1 and {MAX_STRESS_REQUESTS}"
        )));
    }

    let requests = StressRequest::sweep(body.count);
    match state.stress.run(requests, state.shutdown.child_token()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e @ StressError::Cancelled { .. }) => {
            error_response(&AppError::Unavailable(e.to_string()))
        }
        Err(e) => error_response(&AppError::Internal(e.to_string())),
    }
}
