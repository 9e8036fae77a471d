//! The named [`RateLimiter`] handle.
//!
//! Wraps one of the three algorithms behind a shared, cloneable handle that
//! counts decisions, emits [`RateLimiterEvent`]s and records metrics. The
//! algorithm itself holds the lock; the counters are plain atomics updated
//! after each decision.

use crate::algorithm::RateLimitAlgorithm;
use crate::config::RateLimiterConfig;
use crate::error::RateLimitError;
use crate::events::RateLimiterEvent;
use crate::layer::RateLimiterLayer;
use crate::{Admission, Decision, LeakyBucket, SlidingWindow, TokenBucket};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_gauge, gauge};

#[cfg(feature = "metrics")]
static METRICS_INIT: std::sync::Once = std::sync::Once::new();

#[derive(Debug)]
enum Algorithm {
    TokenBucket(TokenBucket),
    SlidingWindow(SlidingWindow),
    LeakyBucket(LeakyBucket),
}

impl Algorithm {
    fn from_choice(choice: &RateLimitAlgorithm) -> Self {
        match *choice {
            RateLimitAlgorithm::TokenBucket {
                capacity,
                refill_rate,
                accrual,
            } => Algorithm::TokenBucket(TokenBucket::new(capacity, refill_rate).with_accrual(accrual)),
            RateLimitAlgorithm::SlidingWindow {
                limit,
                window_seconds,
            } => {
                let window = match Duration::try_from_secs_f64(window_seconds) {
                    Ok(window) => window,
                    Err(_) => panic!("sliding window window_seconds must be a positive, finite number"),
                };
                Algorithm::SlidingWindow(SlidingWindow::new(limit, window))
            }
            RateLimitAlgorithm::LeakyBucket {
                capacity,
                leak_rate,
                accrual,
            } => Algorithm::LeakyBucket(LeakyBucket::new(capacity, leak_rate).with_accrual(accrual)),
        }
    }

    fn decide(&self, cost: u32) -> Decision {
        match self {
            Algorithm::TokenBucket(b) => b.decide(cost),
            Algorithm::SlidingWindow(w) => w.decide(cost),
            Algorithm::LeakyBucket(b) => b.decide(cost),
        }
    }

    fn available(&self) -> u32 {
        match self {
            Algorithm::TokenBucket(b) => b.available(),
            Algorithm::SlidingWindow(w) => w.available(),
            Algorithm::LeakyBucket(b) => b.available(),
        }
    }

    fn limit(&self) -> u32 {
        match self {
            Algorithm::TokenBucket(b) => b.capacity(),
            Algorithm::SlidingWindow(w) => w.limit(),
            Algorithm::LeakyBucket(b) => b.capacity(),
        }
    }

    fn reset(&self) {
        match self {
            Algorithm::TokenBucket(b) => b.reset(),
            Algorithm::SlidingWindow(w) => w.reset(),
            Algorithm::LeakyBucket(b) => b.reset(),
        }
    }
}

/// Point-in-time view of a rate limiter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RateLimiterStats {
    /// Name of the rate limiter.
    pub name: String,
    /// `token_bucket`, `sliding_window` or `leaky_bucket`.
    pub algorithm: &'static str,
    /// Units a request could consume right now.
    pub available: u32,
    /// Capacity (buckets) or per-window limit.
    pub limit: u32,
    /// Requests admitted since creation or the last reset.
    pub admitted: u64,
    /// Requests denied since creation or the last reset.
    pub denied: u64,
}

struct Shared {
    config: RateLimiterConfig,
    algorithm: Algorithm,
    admitted: AtomicU64,
    denied: AtomicU64,
}

/// A named rate limiter running one of the three algorithms.
///
/// Cheap to clone; clones share state. Decisions never block on time: a
/// denied request is reported to the caller immediately with a retry hint.
///
/// ```rust
/// use bulwark_ratelimiter::{RateLimitAlgorithm, RateLimiter};
/// use std::time::Duration;
///
/// let limiter = RateLimiter::new(
///     "search-api",
///     RateLimitAlgorithm::sliding_window(2, Duration::from_secs(60)),
/// );
///
/// assert!(limiter.check(1).is_ok());
/// assert!(limiter.check(1).is_ok());
/// let err = limiter.check(1).unwrap_err();
/// assert!(err.retry_after().is_some());
/// ```
#[derive(Clone)]
pub struct RateLimiter {
    shared: Arc<Shared>,
}

impl RateLimiter {
    /// Creates a rate limiter with no event listeners.
    ///
    /// # Panics
    ///
    /// Panics if the algorithm parameters are invalid.
    pub fn new(name: impl Into<String>, algorithm: RateLimitAlgorithm) -> Self {
        RateLimiterConfig::builder()
            .name(name)
            .algorithm(algorithm)
            .build()
    }

    /// Creates a new configuration builder.
    pub fn builder() -> crate::RateLimiterConfigBuilder {
        crate::RateLimiterConfigBuilder::new()
    }

    /// Creates a rate limiter from a configuration.
    ///
    /// # Panics
    ///
    /// Panics if the algorithm parameters are invalid.
    pub fn from_config(config: RateLimiterConfig) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "ratelimiter_calls_admitted_total",
                "Total number of requests admitted by the rate limiter"
            );
            describe_counter!(
                "ratelimiter_calls_denied_total",
                "Total number of requests denied by the rate limiter"
            );
            describe_gauge!(
                "ratelimiter_available_capacity",
                "Units available after the most recent decision"
            );
        });

        let algorithm = Algorithm::from_choice(&config.algorithm);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            rate_limiter = %config.name,
            algorithm = %config.algorithm,
            limit = algorithm.limit(),
            "rate limiter created"
        );

        Self {
            shared: Arc::new(Shared {
                config,
                algorithm,
                admitted: AtomicU64::new(0),
                denied: AtomicU64::new(0),
            }),
        }
    }

    /// Name of the protected resource.
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// The limiter's configuration.
    pub fn config(&self) -> &RateLimiterConfig {
        &self.shared.config
    }

    /// Asks for admission of a request consuming `cost` units.
    pub fn check(&self, cost: u32) -> Result<(), RateLimitError> {
        let shared = &self.shared;
        let name = &shared.config.name;
        let decision = shared.algorithm.decide(cost);

        #[cfg(feature = "metrics")]
        gauge!("ratelimiter_available_capacity", "ratelimiter" => name.clone())
            .set(f64::from(decision.remaining));

        if decision.admitted {
            shared.admitted.fetch_add(1, Ordering::Relaxed);

            #[cfg(feature = "tracing")]
            tracing::trace!(rate_limiter = %name, cost, remaining = decision.remaining, "request admitted");

            #[cfg(feature = "metrics")]
            counter!("ratelimiter_calls_admitted_total", "ratelimiter" => name.clone()).increment(1);

            shared.config.event_listeners.emit(&RateLimiterEvent::Admitted {
                pattern_name: name.clone(),
                timestamp: Instant::now(),
                cost,
                remaining: decision.remaining,
            });
            return Ok(());
        }

        shared.denied.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            rate_limiter = %name,
            cost,
            retry_after = ?decision.retry_after,
            "request denied"
        );

        #[cfg(feature = "metrics")]
        counter!("ratelimiter_calls_denied_total", "ratelimiter" => name.clone()).increment(1);

        shared.config.event_listeners.emit(&RateLimiterEvent::Denied {
            pattern_name: name.clone(),
            timestamp: Instant::now(),
            cost,
            retry_after: decision.retry_after,
        });

        Err(RateLimitError::Exceeded {
            name: name.clone(),
            retry_after: decision.retry_after,
        })
    }

    /// Returns a snapshot of the limiter without consuming capacity.
    pub fn stats(&self) -> RateLimiterStats {
        let shared = &self.shared;
        RateLimiterStats {
            name: shared.config.name.clone(),
            algorithm: shared.config.algorithm.kind(),
            available: shared.algorithm.available(),
            limit: shared.algorithm.limit(),
            admitted: shared.admitted.load(Ordering::Relaxed),
            denied: shared.denied.load(Ordering::Relaxed),
        }
    }

    /// Restores full capacity and clears the counters.
    pub fn reset(&self) {
        let shared = &self.shared;
        shared.algorithm.reset();
        shared.admitted.store(0, Ordering::Relaxed);
        shared.denied.store(0, Ordering::Relaxed);

        #[cfg(feature = "tracing")]
        tracing::debug!(rate_limiter = %shared.config.name, "rate limiter reset");

        shared.config.event_listeners.emit(&RateLimiterEvent::Reset {
            pattern_name: shared.config.name.clone(),
            timestamp: Instant::now(),
        });
    }

    /// Builds a Tower layer that checks this limiter before each request.
    pub fn layer(&self) -> RateLimiterLayer {
        RateLimiterLayer::new(self.clone())
    }
}

impl Admission for RateLimiter {
    fn allow_n(&self, cost: u32) -> bool {
        self.check(cost).is_ok()
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.shared.config.name)
            .field("algorithm", &self.shared.algorithm)
            .finish()
    }
}
