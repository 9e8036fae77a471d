//! Unified error type for composed resilience calls.
//!
//! Each pattern crate has its own precise error type (`BulkheadError`,
//! `RateLimitError`, `TimeoutError`, `FallbackError`) and a `From`
//! conversion into [`ResilienceError`]. A caller that wires several patterns
//! around one protected operation can therefore use a single error type and
//! `?` through every layer:
//!
//! ```rust
//! use bulwark_core::ResilienceError;
//!
//! #[derive(Debug)]
//! enum DbError {
//!     ConnectionReset,
//! }
//!
//! fn status_code(error: &ResilienceError<DbError>) -> u16 {
//!     match error {
//!         ResilienceError::BulkheadFull { .. } => 503,
//!         ResilienceError::RateLimited { .. } => 429,
//!         ResilienceError::FallbackExhausted { .. } => 502,
//!         ResilienceError::Timeout { .. } | ResilienceError::Application(_) => 500,
//!     }
//! }
//!
//! let err: ResilienceError<DbError> = ResilienceError::RateLimited {
//!     name: "search-api".to_string(),
//!     retry_after: None,
//! };
//! assert_eq!(status_code(&err), 429);
//! assert!(err.is_rejection());
//! ```

use std::fmt;
use std::time::Duration;

/// A common error type that wraps every resilience rejection plus the
/// application's own error.
///
/// Admission rejections (`BulkheadFull`, `RateLimited`) are expected,
/// high-frequency outcomes: callers usually translate them into
/// "temporarily unavailable" or "too many requests" responses.
/// `FallbackExhausted` is a hard failure. `Timeout` is only produced when a
/// caller opted into strict budget enforcement.
#[derive(Debug, Clone)]
pub enum ResilienceError<E> {
    /// The bulkhead had no free permit.
    BulkheadFull {
        /// Bulkhead (resource pool) name.
        name: String,
        /// Calls in flight when the request was rejected.
        active_calls: usize,
        /// Configured concurrency cap.
        max_concurrent_calls: usize,
    },

    /// A rate limiter denied admission.
    RateLimited {
        /// Rate limiter name.
        name: String,
        /// Best-effort hint of when capacity frees up.
        retry_after: Option<Duration>,
    },

    /// An execution budget was exceeded.
    Timeout {
        /// Name of the pattern instance that measured the budget.
        name: String,
        /// The budget that was exceeded.
        timeout: Duration,
    },

    /// Every bound fallback level failed.
    FallbackExhausted {
        /// Fallback chain name.
        name: String,
        /// Levels that were attempted, in order.
        attempted: Vec<String>,
    },

    /// The protected operation itself failed.
    Application(E),
}

impl<E> fmt::Display for ResilienceError<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResilienceError::BulkheadFull {
                name,
                active_calls,
                max_concurrent_calls,
            } => write!(
                f,
                "bulkhead '{}' is full ({}/{})",
                name, active_calls, max_concurrent_calls
            ),
            ResilienceError::RateLimited { name, retry_after } => match retry_after {
                Some(d) => write!(f, "rate limiter '{}' denied call, retry after {:?}", name, d),
                None => write!(f, "rate limiter '{}' denied call", name),
            },
            ResilienceError::Timeout { name, timeout } => {
                write!(f, "'{}' exceeded its {:?} budget", name, timeout)
            }
            ResilienceError::FallbackExhausted { name, attempted } => write!(
                f,
                "all fallback levels exhausted for '{}' (attempted: {})",
                name,
                attempted.join(", ")
            ),
            ResilienceError::Application(e) => write!(f, "application error: {}", e),
        }
    }
}

impl<E> std::error::Error for ResilienceError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResilienceError::Application(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> ResilienceError<E> {
    /// Returns `true` for admission rejections (bulkhead full or rate limited).
    pub fn is_rejection(&self) -> bool {
        self.is_bulkhead_full() || self.is_rate_limited()
    }

    /// Returns `true` if the bulkhead rejected the call.
    pub fn is_bulkhead_full(&self) -> bool {
        matches!(self, ResilienceError::BulkheadFull { .. })
    }

    /// Returns `true` if a rate limiter rejected the call.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ResilienceError::RateLimited { .. })
    }

    /// Returns `true` if an execution budget was exceeded.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ResilienceError::Timeout { .. })
    }

    /// Returns `true` if the fallback chain ran out of levels.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, ResilienceError::FallbackExhausted { .. })
    }

    /// Returns `true` if the operation itself failed.
    pub fn is_application(&self) -> bool {
        matches!(self, ResilienceError::Application(_))
    }

    /// Extracts the application error, if any.
    pub fn application_error(self) -> Option<E> {
        match self {
            ResilienceError::Application(e) => Some(e),
            _ => None,
        }
    }

    /// Maps the application error, leaving resilience variants untouched.
    ///
    /// ```
    /// use bulwark_core::ResilienceError;
    ///
    /// let err: ResilienceError<String> = ResilienceError::Application("boom".to_string());
    /// let mapped: ResilienceError<usize> = err.map_application(|s| s.len());
    /// assert_eq!(mapped.application_error(), Some(4));
    /// ```
    pub fn map_application<F, T>(self, f: F) -> ResilienceError<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            ResilienceError::BulkheadFull {
                name,
                active_calls,
                max_concurrent_calls,
            } => ResilienceError::BulkheadFull {
                name,
                active_calls,
                max_concurrent_calls,
            },
            ResilienceError::RateLimited { name, retry_after } => {
                ResilienceError::RateLimited { name, retry_after }
            }
            ResilienceError::Timeout { name, timeout } => ResilienceError::Timeout { name, timeout },
            ResilienceError::FallbackExhausted { name, attempted } => {
                ResilienceError::FallbackExhausted { name, attempted }
            }
            ResilienceError::Application(e) => ResilienceError::Application(f(e)),
        }
    }
}
