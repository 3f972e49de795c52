//! Exchange rate sources.
//!
//! A [`RateSource`] answers "how many units of `to` buy one unit of `from`".
//! The resolver adds caching and timeouts on top; sources only fetch.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use forexa_shared::Currency;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::error::ConversionError;

/// Upstream supplier of exchange rates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the rate for one unit of `from` expressed in `to`.
    async fn fetch_rate(&self, from: Currency, to: Currency) -> Result<Decimal, ConversionError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Fixed USD-pivot rate table. Deterministic and offline.
///
/// Cross rates are derived as `to_per_usd / from_per_usd`, so every pair is
/// consistent with every other and inverse pairs are exact reciprocals.
#[derive(Debug, Clone)]
pub struct StaticRateSource {
    per_usd: HashMap<Currency, Decimal>,
}

impl StaticRateSource {
    /// Creates a source with the built-in reference table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            per_usd: usd_reference_rates().into_iter().collect(),
        }
    }

    /// Overrides (or adds) the units of `currency` per one USD.
    #[must_use]
    pub fn with_rate(mut self, currency: Currency, per_usd: Decimal) -> Self {
        self.per_usd.insert(currency, per_usd);
        self
    }

    fn per_usd(&self, currency: Currency) -> Result<Decimal, ConversionError> {
        self.per_usd
            .get(&currency)
            .copied()
            .filter(|r| *r > Decimal::ZERO)
            .ok_or(ConversionError::InvalidResponse)
    }
}

impl Default for StaticRateSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    async fn fetch_rate(&self, from: Currency, to: Currency) -> Result<Decimal, ConversionError> {
        let from_rate = self.per_usd(from)?;
        let to_rate = self.per_usd(to)?;
        to_rate
            .checked_div(from_rate)
            .ok_or_else(|| ConversionError::Arithmetic(format!("cannot derive {from}/{to} rate")))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Remote rate service speaking the Frankfurter `latest` API shape:
/// `GET {base}/latest?from=USD&to=EUR` → `{"rates":{"EUR":0.92}}`.
#[derive(Debug, Clone)]
pub struct HttpRateSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout_ms: u64,
}

/// Subset of the upstream payload we rely on.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, Decimal>,
}

impl HttpRateSource {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::Network` if the TLS backend or system
    /// configuration prevents building the HTTP client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ConversionError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("forexa/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ConversionError::Network(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: None,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Sends `key` in the `x-api-key` header on every request.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn endpoint(&self, from: Currency, to: Currency) -> String {
        format!(
            "{}/latest?from={from}&to={to}",
            self.base_url.trim_end_matches('/')
        )
    }

    fn transport_error(&self, err: &reqwest::Error) -> ConversionError {
        if err.is_timeout() {
            ConversionError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            ConversionError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_rate(&self, from: Currency, to: Currency) -> Result<Decimal, ConversionError> {
        let mut request = self.client.get(self.endpoint(from, to));
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;
        classify_status(response.status().as_u16())?;

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;
        parse_rate(&body, to)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Maps an upstream HTTP status onto the failure taxonomy.
fn classify_status(status: u16) -> Result<(), ConversionError> {
    match status {
        200..=299 => Ok(()),
        429 => Err(ConversionError::RateLimited(
            "currency service is throttling requests, try again later".to_string(),
        )),
        500..=599 => Err(ConversionError::ServerError { status }),
        _ => Err(ConversionError::InvalidResponse),
    }
}

/// Extracts a positive rate for `to` from an upstream payload.
fn parse_rate(body: &str, to: Currency) -> Result<Decimal, ConversionError> {
    let payload: LatestRatesResponse =
        serde_json::from_str(body).map_err(|_| ConversionError::InvalidResponse)?;
    payload
        .rates
        .get(to.code())
        .copied()
        .filter(|r| *r > Decimal::ZERO)
        .ok_or(ConversionError::InvalidResponse)
}

/// Units of each currency per one US dollar.
fn usd_reference_rates() -> [(Currency, Decimal); 11] {
    [
        (Currency::Usd, Decimal::ONE),
        (Currency::Eur, Decimal::new(85, 2)),
        (Currency::Gbp, Decimal::new(73, 2)),
        (Currency::Jpy, Decimal::new(110, 0)),
        (Currency::Inr, Decimal::new(745, 1)),
        (Currency::Idr, Decimal::new(15_000, 0)),
        (Currency::Sgd, Decimal::new(135, 2)),
        (Currency::Cad, Decimal::new(125, 2)),
        (Currency::Aud, Decimal::new(135, 2)),
        (Currency::Chf, Decimal::new(92, 2)),
        (Currency::Cny, Decimal::new(645, 2)),
    ]
}
