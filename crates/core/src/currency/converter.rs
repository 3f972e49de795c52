//! Precision-aware currency conversion.
//!
//! Composes validation, rate resolution and tiered rounding. The public entry
//! points never panic and never return a bare error to untyped callers:
//! every failure becomes a [`ConversionResult`] with `success: false`.

use std::sync::Arc;

use forexa_shared::{Currency, Money};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::ConversionError;
use super::input::RawInput;
use super::precision::PrecisionTier;
use super::resolver::RateResolver;
use super::validation::{self, ConversionRequest, ValidationError, ValidationResult};

/// A completed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Conversion {
    /// Amount that was converted.
    pub source: Money,
    /// Converted amount, rounded to `tier`.
    pub converted: Money,
    /// Rate applied (1 source = rate target).
    pub rate: Decimal,
    /// Precision tier used for rounding.
    pub tier: PrecisionTier,
}

impl Conversion {
    /// Decimal places in `converted`.
    #[must_use]
    pub const fn precision(&self) -> u32 {
        self.tier.decimal_places()
    }
}

/// Tagged outcome returned to untyped callers.
///
/// `success == true` implies `converted_amount` and `exchange_rate` are set;
/// `success == false` implies only `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    /// Whether the conversion succeeded.
    pub success: bool,
    /// Converted amount at the selected precision, as a JSON number.
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub converted_amount: Option<Decimal>,
    /// Rate applied, as a JSON number.
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub exchange_rate: Option<Decimal>,
    /// Decimal places in `converted_amount`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    /// Human-readable failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionResult {
    /// A failed result carrying only the message.
    #[must_use]
    pub fn failure(error: &ConversionError) -> Self {
        Self {
            success: false,
            converted_amount: None,
            exchange_rate: None,
            precision: None,
            error: Some(error.to_string()),
        }
    }
}

impl From<Conversion> for ConversionResult {
    fn from(conversion: Conversion) -> Self {
        Self {
            success: true,
            converted_amount: Some(conversion.converted.amount),
            exchange_rate: Some(conversion.rate),
            precision: Some(conversion.precision()),
            error: None,
        }
    }
}

impl From<Result<Conversion, ConversionError>> for ConversionResult {
    fn from(outcome: Result<Conversion, ConversionError>) -> Self {
        match outcome {
            Ok(conversion) => conversion.into(),
            Err(e) => Self::failure(&e),
        }
    }
}

/// Converts amounts between currencies with amount-dependent precision.
#[derive(Clone)]
pub struct CurrencyConverter {
    resolver: Arc<RateResolver>,
}

impl CurrencyConverter {
    /// Creates a converter backed by `resolver`.
    #[must_use]
    pub const fn new(resolver: Arc<RateResolver>) -> Self {
        Self { resolver }
    }

    /// The resolver used for rate lookups.
    #[must_use]
    pub fn resolver(&self) -> &RateResolver {
        &self.resolver
    }

    /// Validates untyped input without converting.
    #[must_use]
    pub fn validate_input(
        &self,
        amount: &RawInput,
        from: &RawInput,
        to: &RawInput,
    ) -> ValidationResult {
        validation::validate(amount, from, to)
    }

    /// Validates and converts untyped input.
    ///
    /// Invalid input short-circuits before any rate lookup.
    pub async fn convert(&self, amount: &RawInput, from: &RawInput, to: &RawInput) -> ConversionResult {
        let outcome = match validation::validate_request(amount, from, to) {
            Ok(request) => self.convert_request(&request).await,
            Err(e) => Err(e.into()),
        };

        match &outcome {
            Err(e) if e.is_upstream() => warn!(error = %e, "Conversion failed upstream"),
            Err(ConversionError::Validation(v)) if v.is_security_rejection() => {
                warn!(error = %v, "Suspicious currency input rejected");
            }
            Err(e) => debug!(error = %e, amount_kind = amount.kind(), "Conversion rejected"),
            Ok(_) => {}
        }
        outcome.into()
    }

    /// Converts an already-validated request.
    pub async fn convert_request(
        &self,
        request: &ConversionRequest,
    ) -> Result<Conversion, ConversionError> {
        let rate = self.resolver.get_rate(request.from, request.to).await?;
        convert_at_rate(request.amount, request.from, request.to, rate)
    }
}

/// Applies `rate` to `amount` and rounds to the selected precision tier.
///
/// # Errors
///
/// Returns `Arithmetic` if the product does not fit in a `Decimal`, and
/// `AmountTooSmall` if a non-zero product rounds away to nothing.
pub fn convert_at_rate(
    amount: Decimal,
    from: Currency,
    to: Currency,
    rate: Decimal,
) -> Result<Conversion, ConversionError> {
    let raw = amount.checked_mul(rate).ok_or_else(|| {
        ConversionError::Arithmetic(format!("{amount} {from} at rate {rate} overflows"))
    })?;
    let tier = PrecisionTier::select(amount, to, raw);
    let converted = tier.apply(raw);
    if converted.is_zero() && !raw.is_zero() {
        return Err(ValidationError::AmountTooSmall.into());
    }

    Ok(Conversion {
        source: Money::new(amount, from),
        converted: Money::new(converted, to),
        rate,
        tier,
    })
}
