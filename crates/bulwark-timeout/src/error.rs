//! Error types for the adaptive timeout.

use bulwark_core::ResilienceError;
use std::time::Duration;

/// Error returned by
/// [`AdaptiveTimeout::run_with_deadline`](crate::AdaptiveTimeout::run_with_deadline).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeoutError {
    /// The future did not complete within the bound and was dropped.
    #[error("'{name}' did not complete within {timeout:?}")]
    Elapsed {
        /// Name of the adaptive timeout.
        name: String,
        /// The bound in effect when the future started.
        timeout: Duration,
    },
}

impl<E> From<TimeoutError> for ResilienceError<E> {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Elapsed { name, timeout } => ResilienceError::Timeout { name, timeout },
        }
    }
}
