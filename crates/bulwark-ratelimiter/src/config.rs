use crate::algorithm::{Accrual, RateLimitAlgorithm};
use crate::events::RateLimiterEvent;
use bulwark_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for a [`RateLimiter`](crate::RateLimiter).
#[derive(Clone, Debug)]
pub struct RateLimiterConfig {
    pub(crate) name: String,
    pub(crate) algorithm: RateLimitAlgorithm,
    pub(crate) event_listeners: EventListeners<RateLimiterEvent>,
}

impl RateLimiterConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }

    /// Name of the protected resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The selected algorithm and its parameters.
    pub fn algorithm(&self) -> &RateLimitAlgorithm {
        &self.algorithm
    }
}

/// Builder for [`RateLimiterConfig`].
pub struct RateLimiterConfigBuilder {
    name: String,
    algorithm: RateLimitAlgorithm,
    event_listeners: EventListeners<RateLimiterEvent>,
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - name: `"rate_limiter"`
    /// - algorithm: token bucket, capacity 50, refill 50/s, truncating accrual
    pub fn new() -> Self {
        Self {
            name: "rate_limiter".to_string(),
            algorithm: RateLimitAlgorithm::token_bucket(50, 50.0),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name for this rate limiter instance (used in errors, events
    /// and logs).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the algorithm.
    pub fn algorithm(mut self, algorithm: RateLimitAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Uses a token bucket.
    pub fn token_bucket(self, capacity: u32, refill_rate: f64) -> Self {
        self.algorithm(RateLimitAlgorithm::token_bucket(capacity, refill_rate))
    }

    /// Uses a sliding window.
    pub fn sliding_window(self, limit: u32, window: Duration) -> Self {
        self.algorithm(RateLimitAlgorithm::sliding_window(limit, window))
    }

    /// Uses a leaky bucket.
    pub fn leaky_bucket(self, capacity: u32, leak_rate: f64) -> Self {
        self.algorithm(RateLimitAlgorithm::leaky_bucket(capacity, leak_rate))
    }

    /// Sets the accrual mode of the currently selected bucket algorithm.
    ///
    /// Call after choosing the algorithm. Ignored for a sliding window.
    pub fn accrual(mut self, accrual: Accrual) -> Self {
        self.algorithm = self.algorithm.with_accrual(accrual);
        self
    }

    /// Registers a callback when a request is admitted.
    ///
    /// # Callback Signature
    /// `Fn(u32, u32)` - called with the request cost and the capacity left
    /// after admission.
    pub fn on_admitted<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RateLimiterEvent::Admitted {
                cost, remaining, ..
            } = event
            {
                f(*cost, *remaining);
            }
        }));
        self
    }

    /// Registers a callback when a request is denied.
    ///
    /// # Callback Signature
    /// `Fn(u32, Option<Duration>)` - called with the request cost and the
    /// retry hint.
    ///
    /// # Example
    /// ```rust
    /// use bulwark_ratelimiter::RateLimiterConfig;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let denials = Arc::new(AtomicUsize::new(0));
    /// let counter = Arc::clone(&denials);
    ///
    /// let limiter = RateLimiterConfig::builder()
    ///     .name("login")
    ///     .token_bucket(5, 0.1)
    ///     .on_denied(move |_cost, retry_after| {
    ///         counter.fetch_add(1, Ordering::SeqCst);
    ///         if let Some(wait) = retry_after {
    ///             println!("login throttled, retry in {:?}", wait);
    ///         }
    ///     })
    ///     .build();
    /// # let _ = limiter;
    /// ```
    pub fn on_denied<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, Option<Duration>) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RateLimiterEvent::Denied {
                cost, retry_after, ..
            } = event
            {
                f(*cost, *retry_after);
            }
        }));
        self
    }

    /// Registers a callback when the limiter is reset.
    pub fn on_reset<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RateLimiterEvent::Reset { .. } = event {
                f();
            }
        }));
        self
    }

    /// Builds the configuration without creating a limiter.
    pub fn into_config(self) -> RateLimiterConfig {
        RateLimiterConfig {
            name: self.name,
            algorithm: self.algorithm,
            event_listeners: self.event_listeners,
        }
    }

    /// Builds the rate limiter.
    ///
    /// # Panics
    ///
    /// Panics if the algorithm parameters are invalid (zero capacity or
    /// limit, negative or non-finite rate).
    pub fn build(self) -> crate::RateLimiter {
        crate::RateLimiter::from_config(self.into_config())
    }
}
