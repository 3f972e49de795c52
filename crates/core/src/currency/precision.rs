//! Amount-dependent precision policy.
//!
//! The number of decimal places kept in a converted amount depends on the
//! magnitude of the *input* amount, so micro-amounts keep their significant
//! digits whether the rate multiplies them up or divides them down.
//!
//! | Input amount    | Decimals |
//! |-----------------|----------|
//! | `(0, 0.01)`     | 8        |
//! | `[0.01, 1)`     | 6        |
//! | `[1, 100)`      | 4        |
//! | `[100, ∞)`      | 2        |
//!
//! JPY has no minor unit. For non-micro inputs converted into JPY, results of
//! at least one yen are shown whole, sub-sen results keep 8 decimals, and the
//! rest keep 2. Micro inputs keep 8 decimals for every target.
//!
//! Rounding uses banker's rounding (round half to even) to minimize
//! cumulative errors.

use forexa_shared::Currency;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Lower bound of the 6-decimal tier.
const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Precision tier selected for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionTier {
    /// Input below one cent: 8 decimals.
    Micro,
    /// Input in `[0.01, 1)`: 6 decimals.
    Small,
    /// Input in `[1, 100)`: 4 decimals.
    Standard,
    /// Input of 100 or more: 2 decimals.
    Large,
    /// JPY target of at least one yen: whole units.
    Whole,
}

impl PrecisionTier {
    /// Picks the tier from the input amount alone.
    #[must_use]
    pub fn for_amount(amount: Decimal) -> Self {
        if amount < CENT {
            Self::Micro
        } else if amount < Decimal::ONE {
            Self::Small
        } else if amount < Decimal::ONE_HUNDRED {
            Self::Standard
        } else {
            Self::Large
        }
    }

    /// Picks the tier for a conversion of `amount` into `target` that
    /// produced `converted` before rounding.
    #[must_use]
    pub fn select(amount: Decimal, target: Currency, converted: Decimal) -> Self {
        let by_amount = Self::for_amount(amount);
        if target != Currency::Jpy || by_amount == Self::Micro {
            return by_amount;
        }

        if converted >= Decimal::ONE {
            Self::Whole
        } else if converted < CENT {
            Self::Micro
        } else {
            Self::Large
        }
    }

    /// Number of decimal places kept by this tier.
    #[must_use]
    pub const fn decimal_places(self) -> u32 {
        match self {
            Self::Micro => 8,
            Self::Small => 6,
            Self::Standard => 4,
            Self::Large => 2,
            Self::Whole => 0,
        }
    }

    /// Rounds `value` to this tier's precision.
    #[must_use]
    pub fn apply(self, value: Decimal) -> Decimal {
        round(value, self.decimal_places())
    }
}

/// Round a decimal value using Banker's Rounding.
#[must_use]
pub fn round(value: Decimal, decimal_places: u32) -> Decimal {
    value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
}
