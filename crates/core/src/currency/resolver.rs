//! Exchange rate resolution with caching.
//!
//! Wraps a [`RateSource`] with a bounded upstream timeout and a Moka cache
//! keyed by currency pair. Concurrent misses on the same pair coalesce into a
//! single upstream fetch, so each cache entry has exactly one writer at a
//! time. Failed fetches are never cached.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use forexa_shared::Currency;
use forexa_shared::config::{RateProvider, RatesConfig};
use futures::future::try_join_all;
use moka::future::Cache;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::error::ConversionError;
use super::exchange::ExchangeRate;
use super::source::{HttpRateSource, RateSource, StaticRateSource};

/// Default cache capacity (number of currency pairs).
const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Default time-to-live for cached rates (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

/// Default bound on a single upstream call.
const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Sentinel stored before the first successful fetch.
const NEVER_UPDATED: i64 = i64::MIN;

/// Resolves exchange rates through a cached, time-bounded rate source.
pub struct RateResolver {
    source: Arc<dyn RateSource>,
    cache: Cache<(Currency, Currency), ExchangeRate>,
    timeout: Duration,
    /// Microseconds since the epoch of the newest successful fetch.
    last_update_micros: AtomicI64,
}

impl RateResolver {
    /// Creates a resolver with default settings.
    ///
    /// Default: 1000 pairs max, 5 minute TTL, 5 second upstream timeout.
    #[must_use]
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self::with_config(
            source,
            DEFAULT_CACHE_CAPACITY,
            Duration::from_secs(DEFAULT_TTL_SECS),
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
        )
    }

    /// Creates a resolver with custom configuration.
    ///
    /// # Arguments
    ///
    /// * `source` - Upstream rate supplier
    /// * `max_capacity` - Maximum number of currency pairs to cache
    /// * `ttl` - How long a fetched rate stays fresh
    /// * `timeout` - Upper bound for a single upstream call
    #[must_use]
    pub fn with_config(
        source: Arc<dyn RateSource>,
        max_capacity: u64,
        ttl: Duration,
        timeout: Duration,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            source,
            cache,
            timeout,
            last_update_micros: AtomicI64::new(NEVER_UPDATED),
        }
    }

    /// Builds the configured rate source and wraps it in a resolver.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::Network` if the HTTP client cannot be built.
    pub fn from_config(config: &RatesConfig) -> Result<Self, ConversionError> {
        let source: Arc<dyn RateSource> = match config.provider {
            RateProvider::Static => Arc::new(StaticRateSource::new()),
            RateProvider::Http => {
                let mut http = HttpRateSource::new(config.base_url.clone(), config.timeout())?;
                if let Some(key) = &config.api_key {
                    http = http.with_api_key(key.clone());
                }
                Arc::new(http)
            }
        };

        Ok(Self::with_config(
            source,
            config.cache_capacity,
            config.cache_ttl(),
            config.timeout(),
        ))
    }

    /// Returns units of `to` per one unit of `from`.
    pub async fn get_rate(&self, from: Currency, to: Currency) -> Result<Decimal, ConversionError> {
        Ok(self.get_exchange_rate(from, to).await?.rate)
    }

    /// Returns the full exchange rate record, from cache when fresh.
    pub async fn get_exchange_rate(
        &self,
        from: Currency,
        to: Currency,
    ) -> Result<ExchangeRate, ConversionError> {
        if from == to {
            return Ok(ExchangeRate::identity(from, Utc::now()));
        }

        self.cache
            .try_get_with((from, to), self.fetch(from, to))
            .await
            .map_err(|e| (*e).clone())
    }

    /// Resolves `base` against each of `currencies` concurrently.
    ///
    /// Fails with the first error encountered; no partial map is returned.
    pub async fn get_multiple_rates(
        &self,
        base: Currency,
        currencies: &[Currency],
    ) -> Result<HashMap<Currency, Decimal>, ConversionError> {
        let lookups = currencies.iter().map(|&to| async move {
            self.get_rate(base, to).await.map(|rate| (to, rate))
        });
        Ok(try_join_all(lookups).await?.into_iter().collect())
    }

    /// Fetches a fresh rate for the pair and replaces any cached entry.
    pub async fn refresh(
        &self,
        from: Currency,
        to: Currency,
    ) -> Result<ExchangeRate, ConversionError> {
        if from == to {
            return Ok(ExchangeRate::identity(from, Utc::now()));
        }

        let rate = self.fetch(from, to).await?;
        self.cache.insert((from, to), rate).await;
        Ok(rate)
    }

    /// When the newest successful upstream fetch completed, if ever.
    pub fn last_update_time(&self) -> Option<DateTime<Utc>> {
        match self.last_update_micros.load(Ordering::Acquire) {
            NEVER_UPDATED => None,
            micros => DateTime::from_timestamp_micros(micros),
        }
    }

    /// Drops every cached rate.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Number of currency pairs currently cached.
    pub async fn cached_pairs(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    /// Name of the underlying rate source.
    #[must_use]
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    async fn fetch(&self, from: Currency, to: Currency) -> Result<ExchangeRate, ConversionError> {
        debug!(source = self.source.name(), %from, %to, "Fetching exchange rate");

        let rate = match tokio::time::timeout(self.timeout, self.source.fetch_rate(from, to)).await
        {
            Ok(result) => result,
            Err(_) => Err(ConversionError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
        .inspect_err(|e| {
            warn!(source = self.source.name(), %from, %to, error = %e, "Exchange rate fetch failed");
        })?;

        if rate <= Decimal::ZERO {
            warn!(%from, %to, %rate, "Rate source returned a non-positive rate");
            return Err(ConversionError::InvalidResponse);
        }

        let fetched_at = Utc::now();
        // Monotonic: a slow fetch finishing late never moves the clock back.
        self.last_update_micros
            .fetch_max(fetched_at.timestamp_micros(), Ordering::AcqRel);

        Ok(ExchangeRate::new(from, to, rate, fetched_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::source::MockRateSource;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::AtomicUsize;

    /// Counts upstream calls and answers after a short delay.
    struct CountingSource {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl CountingSource {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl RateSource for CountingSource {
        async fn fetch_rate(
            &self,
            _from: Currency,
            _to: Currency,
        ) -> Result<Decimal, ConversionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(dec!(0.85))
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_cache_miss_then_hit() {
        let source = Arc::new(CountingSource::new(Duration::ZERO));
        let resolver = RateResolver::new(source.clone());

        assert_eq!(
            resolver.get_rate(Currency::Usd, Currency::Eur).await.unwrap(),
            dec!(0.85)
        );
        assert_eq!(
            resolver.get_rate(Currency::Usd, Currency::Eur).await.unwrap(),
            dec!(0.85)
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached_pairs().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_coalesce() {
        let source = Arc::new(CountingSource::new(Duration::from_millis(50)));
        let resolver = Arc::new(RateResolver::new(source.clone()));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.get_rate(Currency::Usd, Currency::Eur).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), dec!(0.85));
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_same_currency_skips_source() {
        let mut mock = MockRateSource::new();
        mock.expect_fetch_rate().never();
        mock.expect_name().return_const("mock");

        let resolver = RateResolver::new(Arc::new(mock));
        assert_eq!(
            resolver.get_rate(Currency::Jpy, Currency::Jpy).await.unwrap(),
            Decimal::ONE
        );
        assert!(resolver.last_update_time().is_none());
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mut mock = MockRateSource::new();
        mock.expect_fetch_rate()
            .times(2)
            .returning(|_, _| Err(ConversionError::Network("connection reset".into())));
        mock.expect_name().return_const("mock");

        let resolver = RateResolver::new(Arc::new(mock));
        for _ in 0..2 {
            let err = resolver.get_rate(Currency::Usd, Currency::Gbp).await.unwrap_err();
            assert_eq!(err.to_string(), "Network error: connection reset");
        }
        assert!(resolver.last_update_time().is_none());
    }

    #[tokio::test]
    async fn test_non_positive_rate_rejected() {
        let mut mock = MockRateSource::new();
        mock.expect_fetch_rate()
            .returning(|_, _| Ok(Decimal::ZERO));
        mock.expect_name().return_const("mock");

        let resolver = RateResolver::new(Arc::new(mock));
        assert_eq!(
            resolver.get_rate(Currency::Usd, Currency::Inr).await,
            Err(ConversionError::InvalidResponse)
        );
    }

    #[tokio::test]
    async fn test_slow_source_times_out() {
        let source = Arc::new(CountingSource::new(Duration::from_secs(10)));
        let resolver = RateResolver::with_config(
            source,
            10,
            Duration::from_secs(60),
            Duration::from_millis(20),
        );

        let err = resolver.get_rate(Currency::Usd, Currency::Eur).await.unwrap_err();
        assert_eq!(err, ConversionError::Timeout { timeout_ms: 20 });
        assert!(err.to_string().starts_with("Request timeout"));
    }

    #[tokio::test]
    async fn test_last_update_time_advances() {
        let resolver = RateResolver::new(Arc::new(StaticRateSource::new()));
        assert!(resolver.last_update_time().is_none());

        resolver.get_rate(Currency::Usd, Currency::Eur).await.unwrap();
        let first = resolver.last_update_time().unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let refreshed = resolver.refresh(Currency::Usd, Currency::Eur).await.unwrap();
        let second = resolver.last_update_time().unwrap();

        assert!(second > first);
        assert_eq!(refreshed.fetched_at.timestamp_micros(), second.timestamp_micros());
    }

    #[tokio::test]
    async fn test_get_multiple_rates() {
        let resolver = RateResolver::new(Arc::new(StaticRateSource::new()));
        let rates = resolver
            .get_multiple_rates(Currency::Usd, &[Currency::Eur, Currency::Jpy, Currency::Usd])
            .await
            .unwrap();

        assert_eq!(rates.len(), 3);
        assert_eq!(rates[&Currency::Eur], dec!(0.85));
        assert_eq!(rates[&Currency::Jpy], dec!(110));
        assert_eq!(rates[&Currency::Usd], Decimal::ONE);
    }

    #[tokio::test]
    async fn test_get_multiple_rates_fails_as_a_whole() {
        let mut mock = MockRateSource::new();
        mock.expect_fetch_rate().returning(|_, to| {
            if to == Currency::Gbp {
                Err(ConversionError::ServerError { status: 503 })
            } else {
                Ok(dec!(1.5))
            }
        });
        mock.expect_name().return_const("mock");

        let resolver = RateResolver::new(Arc::new(mock));
        let err = resolver
            .get_multiple_rates(Currency::Usd, &[Currency::Eur, Currency::Gbp])
            .await
            .unwrap_err();
        assert_eq!(err, ConversionError::ServerError { status: 503 });
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let source = Arc::new(CountingSource::new(Duration::ZERO));
        let resolver = RateResolver::new(source.clone());

        resolver.get_rate(Currency::Usd, Currency::Eur).await.unwrap();
        resolver.invalidate_all();
        assert_eq!(resolver.cached_pairs().await, 0);
        resolver.get_rate(Currency::Usd, Currency::Eur).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_from_config_static() {
        let resolver = RateResolver::from_config(&RatesConfig::default()).unwrap();
        assert_eq!(resolver.source_name(), "static");
        assert_eq!(
            resolver.get_rate(Currency::Usd, Currency::Jpy).await.unwrap(),
            dec!(110)
        );
    }

    #[tokio::test]
    async fn test_from_config_http() {
        let config = RatesConfig {
            provider: RateProvider::Http,
            api_key: Some("secret".into()),
            ..RatesConfig::default()
        };

        let resolver = RateResolver::from_config(&config).unwrap();
        assert_eq!(resolver.source_name(), "http");
    }
}
