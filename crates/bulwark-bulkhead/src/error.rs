//! Error types for the bulkhead.

use bulwark_core::ResilienceError;
use std::fmt;
use std::time::Duration;

/// Rejection returned when every permit of a bulkhead is taken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("bulkhead '{name}' is full ({active_calls}/{max_concurrent_calls} calls active)")]
pub struct BulkheadFull {
    /// Name of the bulkhead.
    pub name: String,
    /// Calls in flight at rejection time.
    pub active_calls: usize,
    /// Configured maximum.
    pub max_concurrent_calls: usize,
}

/// Errors returned by [`Bulkhead::execute`](crate::Bulkhead::execute).
#[derive(Debug)]
pub enum BulkheadError<E> {
    /// No permit was free; the operation never ran.
    Full(BulkheadFull),

    /// The operation completed but ran longer than the soft budget.
    ///
    /// Its result was discarded. Use
    /// [`Bulkhead::execute_timed`](crate::Bulkhead::execute_timed) to keep the
    /// result and receive the flag instead.
    TimeoutExceeded {
        /// Name of the bulkhead.
        name: String,
        /// How long the operation took.
        elapsed: Duration,
        /// The configured budget.
        timeout: Duration,
    },

    /// The operation itself failed.
    Operation(E),
}

impl<E> BulkheadError<E> {
    /// Returns `true` if the call was rejected for lack of capacity.
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    /// Returns `true` if the call overran its budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimeoutExceeded { .. })
    }

    /// Returns the operation's error, if that is what failed.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<BulkheadFull> for BulkheadError<E> {
    fn from(full: BulkheadFull) -> Self {
        Self::Full(full)
    }
}

impl<E: Clone> Clone for BulkheadError<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Full(full) => Self::Full(full.clone()),
            Self::TimeoutExceeded {
                name,
                elapsed,
                timeout,
            } => Self::TimeoutExceeded {
                name: name.clone(),
                elapsed: *elapsed,
                timeout: *timeout,
            },
            Self::Operation(e) => Self::Operation(e.clone()),
        }
    }
}

impl<E: fmt::Display> fmt::Display for BulkheadError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(full) => fmt::Display::fmt(full, f),
            Self::TimeoutExceeded {
                name,
                elapsed,
                timeout,
            } => write!(
                f,
                "bulkhead '{}' call took {:?}, exceeding its {:?} timeout",
                name, elapsed, timeout
            ),
            Self::Operation(e) => write!(f, "operation failed: {}", e),
        }
    }
}

impl<E> std::error::Error for BulkheadError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Full(full) => Some(full),
            Self::TimeoutExceeded { .. } => None,
            Self::Operation(e) => Some(e),
        }
    }
}

impl<E> From<BulkheadError<E>> for ResilienceError<E> {
    fn from(err: BulkheadError<E>) -> Self {
        match err {
            BulkheadError::Full(full) => ResilienceError::BulkheadFull {
                name: full.name,
                active_calls: full.active_calls,
                max_concurrent_calls: full.max_concurrent_calls,
            },
            BulkheadError::TimeoutExceeded { name, timeout, .. } => {
                ResilienceError::Timeout { name, timeout }
            }
            BulkheadError::Operation(e) => ResilienceError::Application(e),
        }
    }
}
