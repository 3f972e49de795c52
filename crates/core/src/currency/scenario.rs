//! Precision scenario suite.
//!
//! A catalog of named conversions covering tier boundaries, micro amounts
//! under extreme rates, large amounts and rejected input. Running the suite
//! against a converter checks the precision contract end to end, whichever
//! rate source backs it.

use serde::Serialize;

use super::converter::{ConversionResult, CurrencyConverter};
use super::input::RawInput;
use super::precision::round;
use super::validation::validate_amount;

/// What a scenario expects from the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Succeeds with exactly this many decimals.
    Precision(u32),
    /// Succeeds and `converted == round(amount * rate, precision)`.
    ExactProduct,
    /// Fails with exactly this message.
    Rejected(&'static str),
}

/// A single named conversion check.
#[derive(Debug, Clone)]
pub struct PrecisionScenario {
    /// Scenario name.
    pub name: &'static str,
    /// Amount as sent by a caller.
    pub amount: RawInput,
    /// Source currency as sent by a caller.
    pub from: &'static str,
    /// Target currency as sent by a caller.
    pub to: &'static str,
    /// Expected outcome.
    pub expectation: Expectation,
}

impl PrecisionScenario {
    fn new(
        name: &'static str,
        amount: impl Into<RawInput>,
        from: &'static str,
        to: &'static str,
        expectation: Expectation,
    ) -> Self {
        Self {
            name,
            amount: amount.into(),
            from,
            to,
            expectation,
        }
    }

    /// Checks `result` against the expectation; `Err` explains a mismatch.
    fn check(&self, result: &ConversionResult) -> Result<(), String> {
        match &self.expectation {
            Expectation::Precision(expected) => match (result.success, result.precision) {
                (true, Some(p)) if p == *expected => Ok(()),
                (true, p) => Err(format!("expected precision {expected}, got {p:?}")),
                (false, _) => Err(format!("expected success, got {:?}", result.error)),
            },
            Expectation::ExactProduct => {
                let (Some(converted), Some(rate), Some(precision)) =
                    (result.converted_amount, result.exchange_rate, result.precision)
                else {
                    return Err(format!("expected success, got {:?}", result.error));
                };
                let amount = validate_amount(&self.amount).map_err(|e| e.to_string())?;
                let expected = amount
                    .checked_mul(rate)
                    .map(|raw| round(raw, precision))
                    .ok_or_else(|| format!("{amount} x {rate} overflows"))?;
                if converted == expected {
                    Ok(())
                } else {
                    Err(format!("expected {expected}, got {converted}"))
                }
            }
            Expectation::Rejected(message) => match &result.error {
                Some(e) if !result.success && e.as_str() == *message => Ok(()),
                Some(e) => Err(format!("expected error {message:?}, got {e:?}")),
                None => Err(format!("expected error {message:?}, conversion succeeded")),
            },
        }
    }
}

/// Outcome of one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    /// Scenario name.
    pub name: &'static str,
    /// Whether the expectation held.
    pub passed: bool,
    /// What the converter returned.
    pub result: ConversionResult,
    /// Why the scenario failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Aggregate of a suite run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Per-scenario outcomes in catalog order.
    pub outcomes: Vec<ScenarioOutcome>,
    /// Number of scenarios that passed.
    pub passed: usize,
    /// Number of scenarios that failed.
    pub failed: usize,
}

impl ScenarioReport {
    /// True when every scenario passed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// The standard precision catalog.
#[must_use]
pub fn catalog() -> Vec<PrecisionScenario> {
    use Expectation::{ExactProduct, Precision, Rejected};

    vec![
        PrecisionScenario::new("cent boundary", 0.01, "USD", "EUR", Precision(6)),
        PrecisionScenario::new("just below cent", 0.0099, "USD", "EUR", Precision(8)),
        PrecisionScenario::new("one unit boundary", 1.0, "USD", "EUR", Precision(4)),
        PrecisionScenario::new("hundred boundary", 100.0, "USD", "EUR", Precision(2)),
        PrecisionScenario::new("smallest supported", 0.000_000_01, "USD", "GBP", Precision(8)),
        PrecisionScenario::new("micro at high rate", 0.001, "USD", "JPY", Precision(8)),
        PrecisionScenario::new("micro at low rate", 0.001, "JPY", "USD", Precision(8)),
        PrecisionScenario::new("micro into rupee", 0.005, "USD", "INR", Precision(8)),
        PrecisionScenario::new("euro to yen", 0.5, "EUR", "JPY", ExactProduct),
        PrecisionScenario::new("ten million", 10_000_000.0, "USD", "EUR", ExactProduct),
        PrecisionScenario::new("ten million into yen", 10_000_000.0, "USD", "JPY", ExactProduct),
        PrecisionScenario::new(
            "lowercase source",
            100.0,
            "usd",
            "EUR",
            Rejected("Currency code must be uppercase"),
        ),
        PrecisionScenario::new(
            "below smallest",
            0.000_000_000_001,
            "USD",
            "EUR",
            Rejected("Amount is too small to process accurately"),
        ),
        PrecisionScenario::new(
            "zero amount",
            0.0,
            "USD",
            "EUR",
            Rejected("Amount must be greater than 0"),
        ),
        PrecisionScenario::new(
            "not a number",
            f64::NAN,
            "USD",
            "EUR",
            Rejected("Amount must be a finite number"),
        ),
        PrecisionScenario::new(
            "sql injection",
            1.0,
            "'; DROP TABLE rates; --",
            "EUR",
            Rejected("Currency code contains invalid characters"),
        ),
        PrecisionScenario::new(
            "unsupported code",
            1.0,
            "USD",
            "XYZ",
            Rejected("Invalid currency code: XYZ"),
        ),
    ]
}

/// Runs `scenarios` sequentially against `converter`.
pub async fn run_scenarios(
    converter: &CurrencyConverter,
    scenarios: &[PrecisionScenario],
) -> ScenarioReport {
    let mut outcomes = Vec::with_capacity(scenarios.len());

    for scenario in scenarios {
        let result = converter
            .convert(
                &scenario.amount,
                &RawInput::from(scenario.from),
                &RawInput::from(scenario.to),
            )
            .await;
        let detail = scenario.check(&result).err();
        outcomes.push(ScenarioOutcome {
            name: scenario.name,
            passed: detail.is_none(),
            result,
            detail,
        });
    }

    let passed = outcomes.iter().filter(|o| o.passed).count();
    ScenarioReport {
        failed: outcomes.len() - passed,
        passed,
        outcomes,
    }
}
