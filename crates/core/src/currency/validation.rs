//! Input validation for conversion requests.
//!
//! Narrows untyped caller input into a typed [`ConversionRequest`]. Rules run
//! in a fixed order and the first failing rule decides the reported error:
//! the amount is checked first, then the source currency, then the target.

use std::str::FromStr;

use forexa_shared::Currency;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Serialize;
use thiserror::Error;

use super::input::RawInput;

/// Smallest amount accepted. Anything below cannot survive the trip through
/// decimal conversion and rate multiplication with its digits intact.
pub const MIN_SAFE_AMOUNT: f64 = f64::EPSILON;

/// Largest integer a caller's IEEE-754 double can represent exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Currency strings longer than this are reported as oversized input rather
/// than as a simple length mismatch.
pub const MAX_CURRENCY_CODE_LENGTH: usize = 16;

/// Reasons a conversion request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Amount was null or not supplied.
    #[error("Amount is required")]
    AmountRequired,

    /// Amount was not numeric.
    #[error("Amount must be a valid number")]
    AmountNotNumber,

    /// Amount was NaN or infinite.
    #[error("Amount must be a finite number")]
    AmountNotFinite,

    /// Amount was zero or negative.
    #[error("Amount must be greater than 0")]
    AmountNotPositive,

    /// Amount is below [`MIN_SAFE_AMOUNT`].
    #[error("Amount is too small to process accurately")]
    AmountTooSmall,

    /// Amount is at or above [`MAX_SAFE_INTEGER`].
    #[error("Amount exceeds maximum safe processing limit")]
    AmountTooLarge,

    /// Currency was null or not supplied.
    #[error("Currency code is required")]
    CurrencyRequired,

    /// Currency was not a string.
    #[error("Currency code must be a string")]
    CurrencyNotString,

    /// Currency was an empty string.
    #[error("Currency code cannot be empty")]
    CurrencyEmpty,

    /// Currency contains something other than ASCII letters.
    #[error("Currency code contains invalid characters")]
    CurrencyInvalidCharacters,

    /// Currency is far longer than any ISO code.
    #[error("Currency code exceeds maximum length")]
    CurrencyTooLong,

    /// Currency is not exactly three letters.
    #[error("Currency code must be exactly 3 characters")]
    CurrencyWrongLength,

    /// Currency contains lowercase letters.
    #[error("Currency code must be uppercase")]
    CurrencyNotUppercase,

    /// Well-formed code that is not in the supported set.
    #[error("Invalid currency code: {0}")]
    UnsupportedCurrency(String),
}

impl ValidationError {
    /// True for rejections triggered by adversarial-looking currency input.
    #[must_use]
    pub const fn is_security_rejection(&self) -> bool {
        matches!(
            self,
            Self::CurrencyInvalidCharacters | Self::CurrencyTooLong
        )
    }
}

/// A request whose amount and currencies have all been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Positive amount within the safe range.
    pub amount: Decimal,
    /// Source currency.
    pub from: Currency,
    /// Target currency.
    pub to: Currency,
}

impl ConversionRequest {
    /// Builds a request from already-typed parts.
    #[must_use]
    pub const fn new(amount: Decimal, from: Currency, to: Currency) -> Self {
        Self { amount, from, to }
    }
}

/// Structured validation outcome for untyped callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Whether all inputs passed.
    pub valid: bool,
    /// Human-readable reason when `valid` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    /// A passing result.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    /// A failing result carrying the error message.
    #[must_use]
    pub fn rejected(error: &ValidationError) -> Self {
        Self {
            valid: false,
            error: Some(error.to_string()),
        }
    }
}

/// Validates raw inputs and reports the outcome as a [`ValidationResult`].
///
/// Never panics; every invalid input produces `valid: false` with a message.
#[must_use]
pub fn validate(amount: &RawInput, from: &RawInput, to: &RawInput) -> ValidationResult {
    match validate_request(amount, from, to) {
        Ok(_) => ValidationResult::ok(),
        Err(e) => ValidationResult::rejected(&e),
    }
}

/// Validates raw inputs and narrows them into a [`ConversionRequest`].
///
/// # Errors
///
/// Returns the first rule violation found.
pub fn validate_request(
    amount: &RawInput,
    from: &RawInput,
    to: &RawInput,
) -> Result<ConversionRequest, ValidationError> {
    let amount = validate_amount(amount)?;
    let from = validate_currency(from)?;
    let to = validate_currency(to)?;
    Ok(ConversionRequest { amount, from, to })
}

/// Validates a single amount.
///
/// # Errors
///
/// Returns the first amount rule violated.
pub fn validate_amount(raw: &RawInput) -> Result<Decimal, ValidationError> {
    let value = match raw {
        RawInput::Undefined | RawInput::Null => return Err(ValidationError::AmountRequired),
        RawInput::Number(v) => *v,
        _ => return Err(ValidationError::AmountNotNumber),
    };

    if !value.is_finite() {
        return Err(ValidationError::AmountNotFinite);
    }
    if value <= 0.0 {
        return Err(ValidationError::AmountNotPositive);
    }
    if value < MIN_SAFE_AMOUNT {
        return Err(ValidationError::AmountTooSmall);
    }
    if value >= MAX_SAFE_INTEGER {
        return Err(ValidationError::AmountTooLarge);
    }

    amount_to_decimal(value).ok_or(ValidationError::AmountTooSmall)
}

/// Validates a single currency code.
///
/// # Errors
///
/// Returns the first currency rule violated.
pub fn validate_currency(raw: &RawInput) -> Result<Currency, ValidationError> {
    let code = match raw {
        RawInput::Undefined | RawInput::Null => return Err(ValidationError::CurrencyRequired),
        RawInput::Text(s) => s.as_str(),
        _ => return Err(ValidationError::CurrencyNotString),
    };

    if code.is_empty() {
        return Err(ValidationError::CurrencyEmpty);
    }
    if !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::CurrencyInvalidCharacters);
    }

    // Only ASCII letters remain, so byte length equals character count.
    if code.len() > MAX_CURRENCY_CODE_LENGTH {
        return Err(ValidationError::CurrencyTooLong);
    }
    if code.len() != 3 {
        return Err(ValidationError::CurrencyWrongLength);
    }
    if code.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::CurrencyNotUppercase);
    }

    Currency::from_str(code).map_err(|_| ValidationError::UnsupportedCurrency(code.to_string()))
}

/// Converts a validated double into its shortest exact decimal form.
///
/// `f64`'s `Display` yields the shortest string that round-trips, which is
/// what the caller actually typed. Values needing more than 28 fractional
/// digits fall back to bit-level conversion.
fn amount_to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
        .filter(|d| d.is_sign_positive() && !d.is_zero())
}
