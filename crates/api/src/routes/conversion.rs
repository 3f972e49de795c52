//! Conversion and validation routes.
//!
//! Both routes accept any JSON body and always answer 200; the outcome is
//! carried in the response body. Fields that are missing, or a body that is
//! not a JSON object at all, are treated as absent input.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use forexa_core::currency::{ConversionResult, RawInput, ValidationResult};
use serde_json::Value;
use tracing::debug;

use crate::AppState;

/// Creates the conversion routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/convert", post(convert))
        .route("/validate", post(validate))
}

/// The three untyped fields of a conversion body.
struct ConversionBody {
    amount: RawInput,
    from: RawInput,
    to: RawInput,
}

impl ConversionBody {
    fn parse(payload: Result<Json<Value>, JsonRejection>) -> Self {
        let mut body = match payload {
            Ok(Json(body)) => body,
            Err(rejection) => {
                debug!(error = %rejection, "Unreadable conversion body");
                Value::Null
            }
        };
        let mut take = |field: &str| {
            RawInput::from_field(body.as_object_mut().and_then(|o| o.remove(field)))
        };

        Self {
            amount: take("amount"),
            from: take("fromCurrency"),
            to: take("toCurrency"),
        }
    }
}

/// POST `/convert` - Validate and convert an amount.
async fn convert(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Json<ConversionResult> {
    let body = ConversionBody::parse(payload);
    Json(
        state
            .converter
            .convert(&body.amount, &body.from, &body.to)
            .await,
    )
}

/// POST `/validate` - Validate a conversion request without converting.
async fn validate(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Json<ValidationResult> {
    let body = ConversionBody::parse(payload);
    Json(
        state
            .converter
            .validate_input(&body.amount, &body.from, &body.to),
    )
}
