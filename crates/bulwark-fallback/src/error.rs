//! Error types for the fallback chain.

use crate::FallbackLevel;
use bulwark_core::ResilienceError;
use std::fmt;

/// One failed attempt: the level and the error its handler returned.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelFailure<E> {
    /// The level whose handler failed.
    pub level: FallbackLevel,
    /// The handler's error.
    pub error: E,
}

/// Errors returned by [`FallbackChain::execute`](crate::FallbackChain::execute).
#[derive(Debug, Clone)]
pub enum FallbackError<E> {
    /// Every bound level failed. `failures` lists them in the order tried and
    /// is empty when no handler was bound at all.
    Exhausted {
        /// Name of the chain.
        name: String,
        /// Every attempt, in order.
        failures: Vec<LevelFailure<E>>,
    },
}

impl<E> FallbackError<E> {
    /// The failed attempts, in order.
    pub fn failures(&self) -> &[LevelFailure<E>] {
        match self {
            FallbackError::Exhausted { failures, .. } => failures,
        }
    }

    /// The levels that were attempted, in order.
    pub fn attempted(&self) -> Vec<FallbackLevel> {
        self.failures().iter().map(|f| f.level).collect()
    }

    /// Consumes the error, returning the failed attempts.
    pub fn into_failures(self) -> Vec<LevelFailure<E>> {
        match self {
            FallbackError::Exhausted { failures, .. } => failures,
        }
    }
}

impl<E> fmt::Display for FallbackError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackError::Exhausted { name, failures } if failures.is_empty() => {
                write!(f, "all fallback levels exhausted for '{}' (no handlers bound)", name)
            }
            FallbackError::Exhausted { name, failures } => {
                write!(f, "all fallback levels exhausted for '{}' (attempted: ", name)?;
                for (i, failure) in failures.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", failure.level)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl<E> std::error::Error for FallbackError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures()
            .last()
            .map(|f| &f.error as &(dyn std::error::Error + 'static))
    }
}

impl<E> From<FallbackError<E>> for ResilienceError<E> {
    fn from(err: FallbackError<E>) -> Self {
        let attempted = err.attempted().iter().map(ToString::to_string).collect();
        match err {
            FallbackError::Exhausted { name, .. } => {
                ResilienceError::FallbackExhausted { name, attempted }
            }
        }
    }
}
