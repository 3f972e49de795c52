//! Exchange rate types and logic.

use chrono::{DateTime, Utc};
use forexa_shared::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange rate between two currencies, stamped with when it was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Source currency.
    pub from_currency: Currency,
    /// Target currency.
    pub to_currency: Currency,
    /// Exchange rate (1 from_currency = rate to_currency).
    pub rate: Decimal,
    /// When this rate was retrieved.
    pub fetched_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Creates a new exchange rate.
    #[must_use]
    pub const fn new(
        from_currency: Currency,
        to_currency: Currency,
        rate: Decimal,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            from_currency,
            to_currency,
            rate,
            fetched_at,
        }
    }

    /// Rate of one for a currency against itself.
    #[must_use]
    pub const fn identity(currency: Currency, fetched_at: DateTime<Utc>) -> Self {
        Self::new(currency, currency, Decimal::ONE, fetched_at)
    }
}
