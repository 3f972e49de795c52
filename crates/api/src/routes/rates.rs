//! Exchange rate lookup routes.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use forexa_core::currency::{ConversionError, RawInput, validation::validate_currency};
use forexa_shared::{AppError, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::error_response;
use crate::AppState;

/// Creates the exchange rate routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/rates", get(get_rates))
}

/// Query parameters for a rate lookup.
#[derive(Debug, Deserialize)]
pub struct RatesQuery {
    /// Base currency code (defaults to USD).
    pub base: Option<String>,
    /// Comma-separated target codes (defaults to every other currency).
    pub symbols: Option<String>,
}

/// Rates of every requested currency against the base.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesResponse {
    /// Base currency code.
    pub base: &'static str,
    /// Units of each currency per one unit of `base`.
    pub rates: BTreeMap<&'static str, Decimal>,
    /// Newest successful upstream fetch, if any.
    pub last_updated: Option<DateTime<Utc>>,
}

/// GET `/rates` - Get rates for a base currency.
async fn get_rates(State(state): State<AppState>, Query(query): Query<RatesQuery>) -> Response {
    let (base, symbols) = match parse_query(&query) {
        Ok(parsed) => parsed,
        Err(e) => return error_response(&e.into()),
    };

    let resolver = state.converter.resolver();
    match resolver.get_multiple_rates(base, &symbols).await {
        Ok(rates) => {
            let response = RatesResponse {
                base: base.code(),
                rates: rates.into_iter().map(|(c, r)| (c.code(), r)).collect(),
                last_updated: resolver.last_update_time(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!(error = %e, %base, "Failed to get exchange rates");
            error_response(&AppError::from(e))
        }
    }
}

fn parse_query(query: &RatesQuery) -> Result<(Currency, Vec<Currency>), ConversionError> {
    let base = match &query.base {
        Some(code) => parse_code(code)?,
        None => Currency::Usd,
    };

    let symbols = match &query.symbols {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_code)
            .collect::<Result<Vec<_>, _>>()?,
        None => Currency::ALL.into_iter().filter(|c| *c != base).collect(),
    };

    Ok((base, symbols))
}

fn parse_code(code: &str) -> Result<Currency, ConversionError> {
    Ok(validate_currency(&RawInput::from(code))?)
}
