//! Configuration for the bulkhead.

use crate::events::BulkheadEvent;
use crate::Priority;
use bulwark_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for one bulkhead (one isolated resource pool).
#[derive(Clone, Debug)]
pub struct BulkheadConfig {
    pub(crate) name: String,
    pub(crate) max_concurrent_calls: usize,
    pub(crate) max_queue_size: usize,
    pub(crate) timeout: Duration,
    pub(crate) priority_enabled: bool,
    pub(crate) event_listeners: EventListeners<BulkheadEvent>,
}

impl BulkheadConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> BulkheadConfigBuilder {
        BulkheadConfigBuilder::new()
    }

    /// Name of the resource pool.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of calls allowed in flight.
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_concurrent_calls
    }

    /// Configured queue size.
    ///
    /// Reserved: the bulkhead never waits for a permit, so this value is only
    /// stored and reported.
    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }

    /// Soft execution budget for a single call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether priority handling was requested.
    ///
    /// Reserved: priorities are accepted and reported but never change
    /// admission order.
    pub fn priority_enabled(&self) -> bool {
        self.priority_enabled
    }
}

/// Builder for [`BulkheadConfig`].
pub struct BulkheadConfigBuilder {
    name: String,
    max_concurrent_calls: usize,
    max_queue_size: usize,
    timeout: Duration,
    priority_enabled: bool,
    event_listeners: EventListeners<BulkheadEvent>,
}

impl BulkheadConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            name: "bulkhead".to_string(),
            max_concurrent_calls: 25,
            max_queue_size: 0,
            timeout: Duration::from_secs(30),
            priority_enabled: false,
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name of the resource pool.
    ///
    /// Default: "bulkhead"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the maximum number of concurrent calls.
    ///
    /// Default: 25
    pub fn max_concurrent_calls(mut self, max: usize) -> Self {
        self.max_concurrent_calls = max;
        self
    }

    /// Sets the queue size.
    ///
    /// Calls are never queued: they either take a free permit or are rejected
    /// immediately. The value is kept so callers can report it.
    ///
    /// Default: 0
    pub fn max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    /// Sets the soft execution budget.
    ///
    /// A call that runs longer than this is flagged after it completes; it is
    /// never interrupted.
    ///
    /// Default: 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the soft execution budget in milliseconds.
    pub fn timeout_ms(self, millis: u64) -> Self {
        self.timeout(Duration::from_millis(millis))
    }

    /// Enables priority metadata.
    ///
    /// Default: false
    pub fn priority_enabled(mut self, enabled: bool) -> Self {
        self.priority_enabled = enabled;
        self
    }

    /// Registers a callback when a call acquires a permit.
    ///
    /// # Callback Signature
    /// `Fn(usize, Priority)` - called with the number of calls in flight
    /// (including this one) and the priority the caller supplied.
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Priority) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BulkheadEvent::CallPermitted {
                concurrent_calls,
                priority,
                ..
            } = event
            {
                f(*concurrent_calls, *priority);
            }
        }));
        self
    }

    /// Registers a callback when a call is rejected because the pool is full.
    ///
    /// # Callback Signature
    /// `Fn(usize, usize)` - called with the calls in flight and the configured
    /// maximum.
    ///
    /// # Example
    /// ```rust
    /// use bulwark_bulkhead::BulkheadConfig;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let rejections = Arc::new(AtomicUsize::new(0));
    /// let counter = Arc::clone(&rejections);
    ///
    /// let bulkhead = BulkheadConfig::builder()
    ///     .name("inventory-db")
    ///     .max_concurrent_calls(8)
    ///     .on_call_rejected(move |active, max| {
    ///         counter.fetch_add(1, Ordering::SeqCst);
    ///         eprintln!("inventory-db full ({}/{})", active, max);
    ///     })
    ///     .build();
    /// # let _ = bulkhead;
    /// ```
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BulkheadEvent::CallRejected {
                active_calls,
                max_concurrent_calls,
                ..
            } = event
            {
                f(*active_calls, *max_concurrent_calls);
            }
        }));
        self
    }

    /// Registers a callback when a call completes successfully.
    ///
    /// # Callback Signature
    /// `Fn(Duration)` - called with the wall-clock duration of the operation.
    pub fn on_call_finished<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BulkheadEvent::CallFinished { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Registers a callback when the operation returns an error.
    ///
    /// # Callback Signature
    /// `Fn(Duration)` - called with the duration until the error.
    pub fn on_call_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BulkheadEvent::CallFailed { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Registers a callback when a completed call ran past the budget.
    ///
    /// # Callback Signature
    /// `Fn(Duration, Duration)` - called with the elapsed time and the budget.
    pub fn on_timeout_exceeded<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BulkheadEvent::TimeoutExceeded {
                elapsed, timeout, ..
            } = event
            {
                f(*elapsed, *timeout);
            }
        }));
        self
    }

    /// Builds the configuration without creating a bulkhead.
    ///
    /// # Panics
    ///
    /// Panics if `max_concurrent_calls` or `timeout` is zero.
    pub fn into_config(self) -> BulkheadConfig {
        assert!(
            self.max_concurrent_calls > 0,
            "max_concurrent_calls must be greater than zero"
        );
        assert!(!self.timeout.is_zero(), "timeout must be greater than zero");

        BulkheadConfig {
            name: self.name,
            max_concurrent_calls: self.max_concurrent_calls,
            max_queue_size: self.max_queue_size,
            timeout: self.timeout,
            priority_enabled: self.priority_enabled,
            event_listeners: self.event_listeners,
        }
    }

    /// Builds the bulkhead.
    ///
    /// # Panics
    ///
    /// Panics if `max_concurrent_calls` or `timeout` is zero.
    pub fn build(self) -> crate::Bulkhead {
        crate::Bulkhead::new(self.into_config())
    }
}

impl Default for BulkheadConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
