//! Property-based tests for currency conversion.
//!
//! - Property 1: Idempotence
//! - Property 2: Monotonic Precision Tiering
//! - Property 3: Round-Trip Error Bound
//! - Property 4: Validation Totality
//! - Property 5: Security Rejection

use forexa_shared::Currency;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::converter::convert_at_rate;
use super::error::ConversionError;
use super::input::RawInput;
use super::precision::{PrecisionTier, round};
use super::source::{RateSource, StaticRateSource};
use super::validation::{self, ValidationError};

/// Strategy to generate amounts across every tier (0.00000001 to 10,000,000,000).
fn any_tier_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000_000_000i64).prop_map(|v| Decimal::new(v, 8))
}

/// Strategy to pick a supported currency.
fn currency() -> impl Strategy<Value = Currency> {
    prop::sample::select(Currency::ALL.to_vec())
}

/// Strategy to pick a supported currency other than JPY.
fn non_yen_currency() -> impl Strategy<Value = Currency> {
    currency().prop_filter("JPY has its own precision rule", |c| *c != Currency::Jpy)
}

/// Strategy to generate arbitrary untyped input, nested one level deep.
fn raw_input() -> impl Strategy<Value = RawInput> {
    let leaf = prop_oneof![
        Just(RawInput::Undefined),
        Just(RawInput::Null),
        Just(RawInput::Object),
        any::<bool>().prop_map(RawInput::Bool),
        any::<f64>().prop_map(RawInput::Number),
        prop_oneof![Just(f64::NAN), Just(f64::INFINITY), Just(-0.0), Just(1e-300)]
            .prop_map(RawInput::Number),
        ".{0,40}".prop_map(RawInput::Text),
        "[A-Za-z]{0,20}".prop_map(RawInput::Text),
    ];
    leaf.prop_recursive(1, 8, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(RawInput::Array)
    })
}

/// The error reported when a conversion would round away to nothing.
fn too_small() -> ConversionError {
    ValidationError::AmountTooSmall.into()
}

/// Reference rate for a pair.
fn static_rate(from: Currency, to: Currency) -> Decimal {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime
        .block_on(StaticRateSource::new().fetch_rate(from, to))
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // =========================================================================
    // Property 1: Idempotence
    // =========================================================================

    /// *For any* valid conversion, converting the same input twice yields the
    /// same output, and re-rounding the output changes nothing.
    #[test]
    fn prop_conversion_is_idempotent(
        amount in any_tier_amount(),
        from in currency(),
        to in currency(),
    ) {
        let rate = static_rate(from, to);
        let first = convert_at_rate(amount, from, to, rate);
        let second = convert_at_rate(amount, from, to, rate);
        prop_assert_eq!(&first, &second);

        let first = match first {
            Ok(conversion) => conversion,
            Err(e) => {
                prop_assert_eq!(e, too_small());
                return Ok(());
            }
        };
        prop_assert!(!first.converted.amount.is_zero());
        prop_assert_eq!(first.tier.apply(first.converted.amount), first.converted.amount);
        prop_assert!(first.converted.amount.scale() <= first.precision());
    }

    // =========================================================================
    // Property 2: Monotonic Precision Tiering
    // =========================================================================

    /// *For any* a <= b and a target other than JPY, the precision chosen for
    /// a is at least the precision chosen for b.
    #[test]
    fn prop_precision_is_monotonic(
        a in any_tier_amount(),
        b in any_tier_amount(),
        to in non_yen_currency(),
    ) {
        let (small, large) = if a <= b { (a, b) } else { (b, a) };
        let p_small = PrecisionTier::select(small, to, small).decimal_places();
        let p_large = PrecisionTier::select(large, to, large).decimal_places();
        prop_assert!(
            p_small >= p_large,
            "{} got {} decimals but {} got {}",
            small, p_small, large, p_large
        );
    }

    // =========================================================================
    // Property 3: Round-Trip Error Bound
    // =========================================================================

    /// *For any* amount converted A -> B -> A, the drift stays within the
    /// rounding error introduced at each leg.
    #[test]
    fn prop_round_trip_error_is_bounded(
        amount in any_tier_amount(),
        a in currency(),
        b in currency(),
    ) {
        let half_ulp = |places: u32| Decimal::new(5, places + 1);

        let there = match convert_at_rate(amount, a, b, static_rate(a, b)) {
            Ok(conversion) => conversion,
            Err(e) => {
                prop_assert_eq!(e, too_small());
                return Ok(());
            }
        };
        let back_rate = static_rate(b, a);
        let back = match convert_at_rate(there.converted.amount, b, a, back_rate) {
            Ok(conversion) => conversion,
            Err(e) => {
                // The way back can only lose what the first leg's rounding allows.
                prop_assert_eq!(e, too_small());
                prop_assert!(
                    amount <= half_ulp(there.precision()) * back_rate + half_ulp(2) + Decimal::new(1, 10)
                );
                return Ok(());
            }
        };

        let bound = half_ulp(there.precision()) * back_rate
            + half_ulp(back.precision())
            + Decimal::new(1, 10);
        let drift = (back.converted.amount - amount).abs();
        prop_assert!(
            drift <= bound,
            "{} {} -> {} -> {} {} drifted {} (bound {})",
            amount, a, there.converted, back.converted.amount, a, drift, bound
        );
    }

    /// *For any* value and precision, banker's rounding moves the value by at
    /// most half a unit in the last place.
    #[test]
    fn prop_rounding_within_half_ulp(
        value in any_tier_amount(),
        places in 0u32..=8,
    ) {
        let rounded = round(value, places);
        prop_assert!((rounded - value).abs() <= Decimal::new(5, places + 1));
        prop_assert_eq!(round(rounded, places), rounded);
    }

    // =========================================================================
    // Property 4: Validation Totality
    // =========================================================================

    /// *For any* untyped input, validation returns a verdict without
    /// panicking, and every rejection carries a message.
    #[test]
    fn prop_validation_is_total(
        amount in raw_input(),
        from in raw_input(),
        to in raw_input(),
    ) {
        let verdict = validation::validate(&amount, &from, &to);
        let typed = validation::validate_request(&amount, &from, &to);

        prop_assert_eq!(verdict.valid, typed.is_ok());
        if verdict.valid {
            prop_assert!(verdict.error.is_none());
        } else {
            prop_assert!(verdict.error.is_some_and(|e| !e.is_empty()));
        }
    }

    /// *For any* accepted amount, the narrowed decimal is strictly positive.
    #[test]
    fn prop_accepted_amount_is_positive(value in any::<f64>()) {
        if let Ok(amount) = validation::validate_amount(&RawInput::Number(value)) {
            prop_assert!(amount > Decimal::ZERO);
        }
    }

    // =========================================================================
    // Property 5: Security Rejection
    // =========================================================================

    /// *For any* currency containing a character outside A-Z/a-z, validation
    /// fails with the invalid characters message.
    #[test]
    fn prop_non_letters_rejected(
        prefix in "[A-Z]{0,3}",
        special in r#"[0-9 '";<>/\\&%$#@!(){}\-=*.,:_|\x00\t\n]"#,
        suffix in ".{0,10}",
    ) {
        let code = format!("{prefix}{special}{suffix}");
        let err = validation::validate_currency(&RawInput::Text(code)).unwrap_err();
        prop_assert_eq!(&err, &ValidationError::CurrencyInvalidCharacters);
        prop_assert!(err.is_security_rejection());
    }

    /// *For any* all-letter currency longer than 16 characters, validation
    /// fails with the maximum length message.
    #[test]
    fn prop_long_codes_rejected(code in "[A-Za-z]{17,200}") {
        let err = validation::validate_currency(&RawInput::Text(code)).unwrap_err();
        prop_assert_eq!(&err, &ValidationError::CurrencyTooLong);
        prop_assert!(err.is_security_rejection());
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// Specific example: USD -> IDR -> USD at the reference rates.
    #[test]
    fn test_round_trip_through_idr() {
        let there = convert_at_rate(dec!(1), Currency::Usd, Currency::Idr, dec!(15000)).unwrap();
        assert_eq!(there.converted.amount, dec!(15000.0000));

        let back_rate = static_rate(Currency::Idr, Currency::Usd);
        let back =
            convert_at_rate(there.converted.amount, Currency::Idr, Currency::Usd, back_rate)
                .unwrap();
        assert_eq!(back.converted.amount, dec!(1.00));
    }

    /// Specific example: a micro amount survives USD -> IDR -> USD exactly.
    #[test]
    fn test_micro_round_trip_through_idr() {
        let there =
            convert_at_rate(dec!(0.005), Currency::Usd, Currency::Idr, dec!(15000)).unwrap();
        assert_eq!(there.precision(), 8);

        let back_rate = static_rate(Currency::Idr, Currency::Usd);
        let back =
            convert_at_rate(there.converted.amount, Currency::Idr, Currency::Usd, back_rate)
                .unwrap();
        assert_eq!(back.converted.amount, dec!(0.005));
    }

    /// Specific example: a micro amount whose way back lands in the 2-decimal
    /// tier drifts by at most half a cent.
    #[test]
    fn test_micro_round_trip_back_leg_at_two_decimals() {
        let there = convert_at_rate(
            dec!(0.005),
            Currency::Gbp,
            Currency::Idr,
            static_rate(Currency::Gbp, Currency::Idr),
        )
        .unwrap();
        let back = convert_at_rate(
            there.converted.amount,
            Currency::Idr,
            Currency::Gbp,
            static_rate(Currency::Idr, Currency::Gbp),
        )
        .unwrap();

        assert_eq!(back.precision(), 2);
        assert!(!back.converted.amount.is_zero());
        assert!((back.converted.amount - dec!(0.005)).abs() <= dec!(0.0051));
    }

    /// Specific example: a single quote is rejected before length checks.
    #[test]
    fn test_quote_beats_length() {
        let code = format!("{}'", "A".repeat(100));
        assert_eq!(
            validation::validate_currency(&RawInput::Text(code)),
            Err(ValidationError::CurrencyInvalidCharacters)
        );
    }
}
