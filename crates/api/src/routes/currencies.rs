//! Currency listing routes.

use axum::{Json, Router, routing::get};
use forexa_shared::Currency;
use serde::Serialize;

use crate::AppState;

/// Creates the currency routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/currencies", get(list_currencies))
}

/// Response for a currency.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyResponse {
    /// Currency code (ISO 4217).
    pub code: &'static str,
    /// Currency name.
    pub name: &'static str,
    /// Number of decimal places in the minor unit.
    pub minor_units: u32,
}

/// Supported currencies wrapper.
#[derive(Debug, Serialize)]
pub struct CurrenciesResponse {
    /// Every supported currency.
    pub currencies: Vec<CurrencyResponse>,
}

/// GET `/currencies` - List all supported currencies.
async fn list_currencies() -> Json<CurrenciesResponse> {
    let currencies = Currency::ALL
        .iter()
        .map(|c| CurrencyResponse {
            code: c.code(),
            name: c.name(),
            minor_units: c.minor_units(),
        })
        .collect();

    Json(CurrenciesResponse { currencies })
}
