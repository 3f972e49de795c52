//! Application configuration management.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Exchange rate source configuration.
    #[serde(default)]
    pub rates: RatesConfig,
    /// Stress runner configuration.
    #[serde(default)]
    pub stress: StressConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Which upstream supplies exchange rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateProvider {
    /// Built-in reference table, no network access.
    #[default]
    Static,
    /// Remote HTTP rate service.
    Http,
}

/// Exchange rate source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Rate provider to use.
    #[serde(default)]
    pub provider: RateProvider,
    /// Base URL of the HTTP rate service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Optional API key sent with every upstream request.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Upper bound for a single upstream call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// How long a fetched rate stays fresh, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Maximum number of cached currency pairs.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl RatesConfig {
    /// Upstream timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache time-to-live as a `Duration`.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            provider: RateProvider::default(),
            base_url: default_base_url(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            cache_ttl_secs: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.frankfurter.app".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

fn default_cache_capacity() -> u64 {
    1000
}

/// Stress runner configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StressConfig {
    /// Maximum number of conversions in flight at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

fn default_max_concurrency() -> usize {
    64
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FOREXA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
