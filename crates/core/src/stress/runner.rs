//! Bounded-concurrency conversion runner.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use forexa_shared::config::StressConfig;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::error::StressError;
use super::types::{StressReport, StressRequest};
use crate::currency::{ConversionResult, CurrencyConverter};

/// Drives many conversions through a converter and aggregates the outcome.
pub struct StressRunner {
    converter: Arc<CurrencyConverter>,
    max_concurrency: usize,
}

impl StressRunner {
    /// Creates a runner allowing `max_concurrency` conversions in flight.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConcurrency` when `max_concurrency` is zero.
    pub fn new(
        converter: Arc<CurrencyConverter>,
        max_concurrency: usize,
    ) -> Result<Self, StressError> {
        if max_concurrency == 0 {
            return Err(StressError::InvalidConcurrency);
        }
        Ok(Self {
            converter,
            max_concurrency,
        })
    }

    /// Creates a runner from the `stress` config section.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConcurrency` when the configured limit is zero.
    pub fn from_config(
        converter: Arc<CurrencyConverter>,
        config: &StressConfig,
    ) -> Result<Self, StressError> {
        Self::new(converter, config.max_concurrency)
    }

    /// Runs every request and returns the aggregated metrics.
    ///
    /// Outcomes are folded by this task alone as they arrive, so the
    /// aggregate needs no locking. Cancelling `cancel` drops in-flight
    /// conversions and discards the partial aggregate.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` if `cancel` fires before the batch completes.
    pub async fn run(
        &self,
        requests: Vec<StressRequest>,
        cancel: CancellationToken,
    ) -> Result<StressReport, StressError> {
        let started = Instant::now();
        let converter = &self.converter;
        let mut outcomes = stream::iter(requests)
            .map(|request| async move {
                let begun = Instant::now();
                let result = converter
                    .convert(&request.amount, &request.from, &request.to)
                    .await;
                (begun.elapsed(), result)
            })
            .buffer_unordered(self.max_concurrency);

        let mut aggregate = Aggregate::default();
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    warn!(completed = aggregate.total, "Stress run cancelled");
                    return Err(StressError::Cancelled { completed: aggregate.total });
                }
                next = outcomes.next() => match next {
                    Some((latency, result)) => aggregate.record(latency, &result),
                    None => break,
                },
            }
        }

        let report = aggregate.finish(started.elapsed());
        info!(
            total = report.total,
            failed = report.failed,
            success_percent = report.success_percent(),
            throughput = report.throughput_per_sec,
            "Stress run completed"
        );
        Ok(report)
    }
}

#[derive(Default)]
struct Aggregate {
    total: u64,
    succeeded: u64,
    min: Option<Duration>,
    max: Duration,
    sum: Duration,
    errors: BTreeMap<String, u64>,
}

impl Aggregate {
    fn record(&mut self, latency: Duration, result: &ConversionResult) {
        self.total += 1;
        self.min = Some(self.min.map_or(latency, |m| m.min(latency)));
        self.max = self.max.max(latency);
        self.sum = self.sum.saturating_add(latency);

        match &result.error {
            None if result.success => self.succeeded += 1,
            error => {
                let message = error.clone().unwrap_or_default();
                *self.errors.entry(message).or_default() += 1;
            }
        }
    }

    fn finish(self, elapsed: Duration) -> StressReport {
        let mean = u32::try_from(self.total)
            .ok()
            .and_then(|n| self.sum.checked_div(n))
            .unwrap_or_default();
        let elapsed_us = micros(elapsed);
        let throughput_per_sec = if elapsed_us == 0 {
            self.total
        } else {
            self.total.saturating_mul(1_000_000) / elapsed_us
        };

        StressReport {
            total: self.total,
            succeeded: self.succeeded,
            failed: self.total - self.succeeded,
            min_latency_us: self.min.map_or(0, micros),
            max_latency_us: micros(self.max),
            mean_latency_us: micros(mean),
            elapsed_us,
            throughput_per_sec,
            errors: self.errors,
        }
    }
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}
