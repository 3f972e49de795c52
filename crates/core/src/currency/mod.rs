//! Currency conversion: validation, exchange rates and precision.

pub mod converter;
pub mod error;
pub mod exchange;
pub mod input;
pub mod precision;
pub mod resolver;
pub mod scenario;
pub mod source;
pub mod validation;

#[cfg(test)]
mod props;

pub use converter::{Conversion, ConversionResult, CurrencyConverter};
pub use error::ConversionError;
pub use exchange::ExchangeRate;
pub use input::RawInput;
pub use precision::PrecisionTier;
pub use resolver::RateResolver;
pub use source::{HttpRateSource, RateSource, StaticRateSource};
pub use validation::{ConversionRequest, ValidationError, ValidationResult, validate};
