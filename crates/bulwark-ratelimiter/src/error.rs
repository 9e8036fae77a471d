use bulwark_core::ResilienceError;
use std::time::Duration;

/// Errors returned by [`RateLimiter::check`](crate::RateLimiter::check).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    /// The request was denied.
    #[error("rate limit exceeded for '{name}'")]
    Exceeded {
        /// Rate limiter name.
        name: String,
        /// Best-effort hint of when the same request could be admitted.
        /// `None` when it never can (cost above capacity, zero rate).
        retry_after: Option<Duration>,
    },
}

impl RateLimitError {
    /// The retry hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RateLimitError::Exceeded { retry_after, .. } => *retry_after,
        }
    }
}

impl<E> From<RateLimitError> for ResilienceError<E> {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::Exceeded { name, retry_after } => {
                ResilienceError::RateLimited { name, retry_after }
            }
        }
    }
}
