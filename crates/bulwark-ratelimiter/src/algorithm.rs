//! Algorithm selection for [`RateLimiter`](crate::RateLimiter).

use std::fmt;
use std::time::Duration;

/// How elapsed time is converted into whole tokens (or leaked units).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Accrual {
    /// Credit `floor(elapsed * rate)` units and restart the clock on every
    /// decision.
    ///
    /// Sub-unit progress is dropped, so callers arriving faster than one unit
    /// period can starve a low-rate limiter.
    #[default]
    Truncating,
    /// Carry sub-unit progress between decisions.
    Fractional,
}

/// Which algorithm a [`RateLimiter`](crate::RateLimiter) runs, with its
/// parameters.
///
/// With the `serde` feature this deserializes from an internally tagged map:
///
/// ```json
/// { "algorithm": "token_bucket", "capacity": 100, "refill_rate": 20.0 }
/// { "algorithm": "sliding_window", "limit": 60, "window_seconds": 60.0 }
/// { "algorithm": "leaky_bucket", "capacity": 10, "leak_rate": 2.0, "accrual": "fractional" }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "algorithm", rename_all = "snake_case"))]
pub enum RateLimitAlgorithm {
    /// Burst up to `capacity`, sustained rate of `refill_rate` per second.
    TokenBucket {
        /// Maximum tokens held.
        capacity: u32,
        /// Tokens added per second.
        refill_rate: f64,
        /// Conversion of elapsed time into tokens.
        #[cfg_attr(feature = "serde", serde(default))]
        accrual: Accrual,
    },
    /// At most `limit` admissions within any trailing `window_seconds`.
    SlidingWindow {
        /// Maximum admissions per window.
        limit: u32,
        /// Window length in seconds.
        window_seconds: f64,
    },
    /// Bounded queue drained at a constant `leak_rate` per second.
    LeakyBucket {
        /// Maximum occupancy.
        capacity: u32,
        /// Units drained per second.
        leak_rate: f64,
        /// Conversion of elapsed time into leaked units.
        #[cfg_attr(feature = "serde", serde(default))]
        accrual: Accrual,
    },
}

impl RateLimitAlgorithm {
    /// Token bucket with truncating accrual.
    pub fn token_bucket(capacity: u32, refill_rate: f64) -> Self {
        Self::TokenBucket {
            capacity,
            refill_rate,
            accrual: Accrual::Truncating,
        }
    }

    /// Sliding window over `window`.
    pub fn sliding_window(limit: u32, window: Duration) -> Self {
        Self::SlidingWindow {
            limit,
            window_seconds: window.as_secs_f64(),
        }
    }

    /// Leaky bucket with truncating accrual.
    pub fn leaky_bucket(capacity: u32, leak_rate: f64) -> Self {
        Self::LeakyBucket {
            capacity,
            leak_rate,
            accrual: Accrual::Truncating,
        }
    }

    /// Replaces the accrual mode. Has no effect on a sliding window.
    pub fn with_accrual(self, mode: Accrual) -> Self {
        match self {
            Self::TokenBucket {
                capacity,
                refill_rate,
                ..
            } => Self::TokenBucket {
                capacity,
                refill_rate,
                accrual: mode,
            },
            Self::LeakyBucket {
                capacity,
                leak_rate,
                ..
            } => Self::LeakyBucket {
                capacity,
                leak_rate,
                accrual: mode,
            },
            window @ Self::SlidingWindow { .. } => window,
        }
    }

    /// Short identifier used in logs, metrics labels and stats.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TokenBucket { .. } => "token_bucket",
            Self::SlidingWindow { .. } => "sliding_window",
            Self::LeakyBucket { .. } => "leaky_bucket",
        }
    }
}

impl fmt::Display for RateLimitAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}
