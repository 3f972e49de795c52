//! Stress run error types.

use thiserror::Error;

/// Stress-run errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StressError {
    /// The run was cancelled before every request finished.
    #[error("Stress run cancelled after {completed} requests")]
    Cancelled {
        /// Requests that finished before cancellation.
        completed: u64,
    },

    /// Concurrency must allow at least one request in flight.
    #[error("Max concurrency must be at least 1")]
    InvalidConcurrency,
}
