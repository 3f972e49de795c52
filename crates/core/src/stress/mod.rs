//! Concurrent conversion load runs.

pub mod error;
pub mod runner;
pub mod types;

pub use error::StressError;
pub use runner::StressRunner;
pub use types::{StressReport, StressRequest};
