//! Application-wide error types.

use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Upstream service did not answer in time.
    #[error("Upstream timeout: {0}")]
    Timeout(String),

    /// Upstream service is throttling us.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// External service error.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// The service is shutting down or otherwise cannot take the request.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Timeout(_) => 504,
            Self::RateLimited(_) => 429,
            Self::ExternalService(_) => 502,
            Self::Unavailable(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Timeout(_) => "UPSTREAM_TIMEOUT",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
