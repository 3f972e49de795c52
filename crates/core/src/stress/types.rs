//! Stress run inputs and aggregated metrics.

use std::collections::BTreeMap;

use forexa_shared::Currency;
use serde::Serialize;

use crate::currency::RawInput;

/// Amounts cycled through by [`StressRequest::sweep`], covering every precision
/// tier plus the largest supported magnitude. The smallest still converts to a
/// non-zero amount at the weakest cross rate (IDR to GBP).
const SWEEP_AMOUNTS: [f64; 6] = [0.0005, 0.005, 0.5, 42.0, 1_500.0, 10_000_000.0];

/// One conversion to perform, in untyped caller form.
#[derive(Debug, Clone, PartialEq)]
pub struct StressRequest {
    /// Amount as a caller would send it.
    pub amount: RawInput,
    /// Source currency as a caller would send it.
    pub from: RawInput,
    /// Target currency as a caller would send it.
    pub to: RawInput,
}

impl StressRequest {
    /// Creates a request.
    pub fn new(
        amount: impl Into<RawInput>,
        from: impl Into<RawInput>,
        to: impl Into<RawInput>,
    ) -> Self {
        Self {
            amount: amount.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// A deterministic batch of `count` valid requests covering every
    /// currency pair and every precision tier.
    #[must_use]
    pub fn sweep(count: usize) -> Vec<Self> {
        let pairs: Vec<(Currency, Currency)> = Currency::ALL
            .iter()
            .flat_map(|from| Currency::ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from != to)
            .collect();

        (0..count)
            .map(|i| {
                let (from, to) = pairs[i % pairs.len()];
                let amount = SWEEP_AMOUNTS[i % SWEEP_AMOUNTS.len()];
                Self::new(amount, from.code(), to.code())
            })
            .collect()
    }
}

/// Aggregated metrics of a completed run.
///
/// Latencies are in microseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StressReport {
    /// Requests processed.
    pub total: u64,
    /// Requests that produced a converted amount.
    pub succeeded: u64,
    /// Requests that produced an error.
    pub failed: u64,
    /// Fastest single conversion.
    pub min_latency_us: u64,
    /// Slowest single conversion.
    pub max_latency_us: u64,
    /// Mean conversion latency.
    pub mean_latency_us: u64,
    /// Wall-clock duration of the whole run.
    pub elapsed_us: u64,
    /// Completed requests per second of wall-clock time.
    pub throughput_per_sec: u64,
    /// Failure count keyed by error message.
    pub errors: BTreeMap<String, u64>,
}

impl StressReport {
    /// Share of requests that succeeded, in whole percent.
    #[must_use]
    pub fn success_percent(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        self.succeeded.saturating_mul(100) / self.total
    }
}
