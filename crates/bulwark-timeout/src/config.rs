//! Configuration for the adaptive timeout.

use crate::events::TimeoutEvent;
use bulwark_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for one [`AdaptiveTimeout`](crate::AdaptiveTimeout).
#[derive(Clone, Debug)]
pub struct AdaptiveTimeoutConfig {
    pub(crate) name: String,
    pub(crate) connection_timeout: Duration,
    pub(crate) read_timeout: Duration,
    pub(crate) request_timeout: Duration,
    pub(crate) adaptive_enabled: bool,
    pub(crate) history_size: usize,
    pub(crate) min_samples: usize,
    pub(crate) percentile_multiplier: f64,
    pub(crate) event_listeners: EventListeners<TimeoutEvent>,
}

impl AdaptiveTimeoutConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> AdaptiveTimeoutConfigBuilder {
        AdaptiveTimeoutConfigBuilder::new()
    }

    /// Name of the protected resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Static connection timeout. Reported, never adapted.
    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    /// Static read timeout. Reported, never adapted.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Static request timeout, the ceiling for every computed bound.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Whether the bound adapts to observed latency.
    pub fn adaptive_enabled(&self) -> bool {
        self.adaptive_enabled
    }

    /// Number of latency samples retained.
    pub fn history_size(&self) -> usize {
        self.history_size
    }

    /// Samples required before the adaptive bound is used.
    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Factor applied to p95 to obtain the adaptive bound.
    pub fn percentile_multiplier(&self) -> f64 {
        self.percentile_multiplier
    }
}

/// Builder for [`AdaptiveTimeoutConfig`].
pub struct AdaptiveTimeoutConfigBuilder {
    name: String,
    connection_timeout: Duration,
    read_timeout: Duration,
    request_timeout: Duration,
    adaptive_enabled: bool,
    history_size: usize,
    min_samples: usize,
    percentile_multiplier: f64,
    event_listeners: EventListeners<TimeoutEvent>,
}

impl AdaptiveTimeoutConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            name: String::from("adaptive_timeout"),
            connection_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            adaptive_enabled: true,
            history_size: 1000,
            min_samples: 100,
            percentile_multiplier: 1.5,
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name used in logs, events and errors.
    ///
    /// Default: "adaptive_timeout"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the connection timeout.
    ///
    /// Default: 5 seconds
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    ///
    /// Default: 30 seconds
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the request timeout ceiling.
    ///
    /// Returned as-is until enough samples are recorded, and never exceeded
    /// afterwards.
    ///
    /// Default: 30 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the request timeout ceiling in milliseconds.
    pub fn request_timeout_ms(self, millis: u64) -> Self {
        self.request_timeout(Duration::from_millis(millis))
    }

    /// Enables or disables adaptation.
    ///
    /// Default: true
    pub fn adaptive_enabled(mut self, enabled: bool) -> Self {
        self.adaptive_enabled = enabled;
        self
    }

    /// Sets how many recent samples are kept.
    ///
    /// Default: 1000
    pub fn history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    /// Sets how many samples must be recorded before the adaptive bound is
    /// trusted. Percentiles are not computed below 10 samples, so smaller
    /// values behave as 10.
    ///
    /// Default: 100
    pub fn min_samples(mut self, samples: usize) -> Self {
        self.min_samples = samples;
        self
    }

    /// Sets the multiplier applied to p95.
    ///
    /// Default: 1.5
    pub fn percentile_multiplier(mut self, multiplier: f64) -> Self {
        self.percentile_multiplier = multiplier;
        self
    }

    /// Registers a callback when the computed bound changes.
    ///
    /// # Callback Signature
    /// `Fn(Duration, Duration)` - called with the previous and the new bound.
    pub fn on_timeout_adjusted<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TimeoutEvent::TimeoutAdjusted {
                previous, current, ..
            } = event
            {
                f(*previous, *current);
            }
        }));
        self
    }

    /// Registers a callback when
    /// [`run_with_deadline`](crate::AdaptiveTimeout::run_with_deadline)
    /// gives up on a future.
    ///
    /// # Callback Signature
    /// `Fn(Duration)` - called with the bound that elapsed.
    pub fn on_deadline_elapsed<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TimeoutEvent::DeadlineElapsed { timeout, .. } = event {
                f(*timeout);
            }
        }));
        self
    }

    /// Builds the configuration.
    ///
    /// # Panics
    ///
    /// Panics if `request_timeout` or `history_size` is zero, if
    /// `min_samples` exceeds `history_size`, or if `percentile_multiplier`
    /// is not a positive finite number.
    pub fn into_config(self) -> AdaptiveTimeoutConfig {
        assert!(
            !self.request_timeout.is_zero(),
            "request_timeout must be greater than zero"
        );
        assert!(self.history_size > 0, "history_size must be greater than zero");
        assert!(
            self.min_samples <= self.history_size,
            "min_samples must not exceed history_size"
        );
        assert!(
            self.percentile_multiplier.is_finite() && self.percentile_multiplier > 0.0,
            "percentile_multiplier must be a positive, finite number"
        );

        AdaptiveTimeoutConfig {
            name: self.name,
            connection_timeout: self.connection_timeout,
            read_timeout: self.read_timeout,
            request_timeout: self.request_timeout,
            adaptive_enabled: self.adaptive_enabled,
            history_size: self.history_size,
            min_samples: self.min_samples,
            percentile_multiplier: self.percentile_multiplier,
            event_listeners: self.event_listeners,
        }
    }

    /// Builds the adaptive timeout.
    ///
    /// # Panics
    ///
    /// See [`into_config`](Self::into_config).
    pub fn build(self) -> crate::AdaptiveTimeout {
        crate::AdaptiveTimeout::new(self.into_config())
    }
}

impl Default for AdaptiveTimeoutConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
