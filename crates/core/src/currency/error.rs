//! Conversion error types.

use forexa_shared::AppError;
use thiserror::Error;

use super::validation::ValidationError;

/// Everything that can go wrong between raw input and a converted amount.
///
/// Display strings are stable: callers and tests match on their prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Upstream did not answer within the configured bound.
    #[error("Request timeout: currency service did not respond within {timeout_ms}ms")]
    Timeout {
        /// The bound that was exceeded.
        timeout_ms: u64,
    },

    /// Transport-level failure reaching the rate service.
    #[error("Network error: {0}")]
    Network(String),

    /// Rate service asked us to back off.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Rate service failed with a 5xx status.
    #[error("Server error: currency service returned status {status}")]
    ServerError {
        /// HTTP status returned upstream.
        status: u16,
    },

    /// Rate service answered with something we cannot use.
    #[error("Invalid response from currency service")]
    InvalidResponse,

    /// Inputs were rejected before any lookup.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Arithmetic failed on validated inputs.
    #[error("Conversion failed: {0}")]
    Arithmetic(String),
}

impl ConversionError {
    /// True when the failure came from the rate source rather than the caller.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Network(_)
                | Self::RateLimited(_)
                | Self::ServerError { .. }
                | Self::InvalidResponse
        )
    }
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        let message = err.to_string();
        match err {
            ConversionError::Validation(_) => Self::Validation(message),
            ConversionError::Timeout { .. } => Self::Timeout(message),
            ConversionError::RateLimited(_) => Self::RateLimited(message),
            ConversionError::Network(_)
            | ConversionError::ServerError { .. }
            | ConversionError::InvalidResponse => Self::ExternalService(message),
            ConversionError::Arithmetic(_) => Self::Internal(message),
        }
    }
}
