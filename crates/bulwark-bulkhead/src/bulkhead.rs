//! The bulkhead itself: permit accounting, execution and stats.

use crate::config::BulkheadConfig;
use crate::error::{BulkheadError, BulkheadFull};
use crate::events::BulkheadEvent;
use crate::layer::BulkheadLayer;
use bulwark_core::percent;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

#[cfg(feature = "metrics")]
static METRICS_INIT: std::sync::Once = std::sync::Once::new();

/// Priority attached to a call.
///
/// Accepted on every call and reported on events and logs, but admission is a
/// single tier: a `Critical` call is rejected just like a `Low` one when the
/// pool is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Priority {
    /// Background work.
    Low,
    /// Regular traffic.
    #[default]
    Normal,
    /// User-facing traffic.
    High,
    /// Traffic that must not be shed.
    Critical,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// A value produced under a bulkhead together with its timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timed<T> {
    /// The operation's output.
    pub value: T,
    /// Wall-clock duration of the operation.
    pub elapsed: Duration,
    /// `true` if `elapsed` exceeded the bulkhead's soft budget.
    pub exceeded: bool,
}

/// Point-in-time view of a bulkhead.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BulkheadStats {
    /// Name of the bulkhead.
    pub name: String,
    /// Calls currently in flight.
    pub active_calls: usize,
    /// Configured maximum.
    pub max_concurrent_calls: usize,
    /// Calls rejected since creation.
    pub rejected_calls: u64,
    /// `active_calls / max_concurrent_calls * 100`, rounded to two decimals.
    pub utilization_percent: f64,
}

struct Shared {
    config: BulkheadConfig,
    semaphore: Arc<Semaphore>,
    active: AtomicUsize,
    rejected: AtomicU64,
}

/// Caps concurrent calls to one named resource and rejects overflow
/// immediately.
///
/// Cloning is cheap and every clone shares the same permits and counters,
/// so one instance per protected resource can be handed to any number of
/// call sites.
///
/// # Example
///
/// ```rust
/// use bulwark_bulkhead::{Bulkhead, Priority};
///
/// # async fn example() {
/// let bulkhead = Bulkhead::builder()
///     .name("orders-db")
///     .max_concurrent_calls(2)
///     .timeout_ms(500)
///     .build();
///
/// let rows = bulkhead
///     .execute(Priority::Normal, || async { Ok::<_, std::io::Error>(vec![1, 2, 3]) })
///     .await
///     .unwrap();
/// assert_eq!(rows.len(), 3);
///
/// let stats = bulkhead.stats();
/// assert_eq!(stats.active_calls, 0);
/// # }
/// ```
#[derive(Clone)]
pub struct Bulkhead {
    shared: Arc<Shared>,
}

impl Bulkhead {
    /// Creates a bulkhead from a configuration.
    pub fn new(config: BulkheadConfig) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "bulkhead_calls_permitted_total",
                "Total number of calls permitted through the bulkhead"
            );
            describe_counter!(
                "bulkhead_calls_rejected_total",
                "Total number of calls rejected by the bulkhead"
            );
            describe_counter!(
                "bulkhead_calls_finished_total",
                "Total number of calls that finished successfully"
            );
            describe_counter!(
                "bulkhead_calls_failed_total",
                "Total number of calls whose operation failed"
            );
            describe_counter!(
                "bulkhead_timeouts_exceeded_total",
                "Total number of calls that ran past the soft budget"
            );
            describe_gauge!(
                "bulkhead_concurrent_calls",
                "Current number of concurrent calls"
            );
            describe_histogram!(
                "bulkhead_call_duration_seconds",
                "Duration of calls through the bulkhead"
            );
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(
            bulkhead = %config.name,
            max_concurrent_calls = config.max_concurrent_calls,
            max_queue_size = config.max_queue_size,
            timeout = ?config.timeout,
            "bulkhead created"
        );

        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_calls));
        Self {
            shared: Arc::new(Shared {
                config,
                semaphore,
                active: AtomicUsize::new(0),
                rejected: AtomicU64::new(0),
            }),
        }
    }

    /// Creates a new configuration builder.
    pub fn builder() -> crate::BulkheadConfigBuilder {
        crate::BulkheadConfigBuilder::new()
    }

    /// The bulkhead's configuration.
    pub fn config(&self) -> &BulkheadConfig {
        &self.shared.config
    }

    /// Name of the resource pool.
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// Takes a permit without waiting.
    ///
    /// The returned [`BulkheadPermit`] releases the slot when dropped, so
    /// the slot is returned on every exit path, including panics and
    /// cancellation of the task holding it.
    pub fn try_acquire(&self, priority: Priority) -> Result<BulkheadPermit, BulkheadFull> {
        let shared = &self.shared;
        let config = &shared.config;

        let permit = match Arc::clone(&shared.semaphore).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                shared.rejected.fetch_add(1, Ordering::SeqCst);
                // Held permits, not `active`: a concurrent winner may not have
                // bumped the counter yet.
                let active_calls = config
                    .max_concurrent_calls
                    .saturating_sub(shared.semaphore.available_permits());

                #[cfg(feature = "tracing")]
                tracing::debug!(
                    bulkhead = %config.name,
                    %priority,
                    active_calls,
                    max_concurrent_calls = config.max_concurrent_calls,
                    "call rejected, bulkhead full"
                );

                #[cfg(feature = "metrics")]
                counter!("bulkhead_calls_rejected_total", "bulkhead" => config.name.clone())
                    .increment(1);

                config.event_listeners.emit(&BulkheadEvent::CallRejected {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    active_calls,
                    max_concurrent_calls: config.max_concurrent_calls,
                    priority,
                });

                return Err(BulkheadFull {
                    name: config.name.clone(),
                    active_calls,
                    max_concurrent_calls: config.max_concurrent_calls,
                });
            }
        };

        let concurrent_calls = shared.active.fetch_add(1, Ordering::SeqCst) + 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(bulkhead = %config.name, %priority, concurrent_calls, "call permitted");

        #[cfg(feature = "metrics")]
        {
            counter!("bulkhead_calls_permitted_total", "bulkhead" => config.name.clone())
                .increment(1);
            gauge!("bulkhead_concurrent_calls", "bulkhead" => config.name.clone())
                .set(concurrent_calls as f64);
        }

        config.event_listeners.emit(&BulkheadEvent::CallPermitted {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            concurrent_calls,
            priority,
        });

        Ok(BulkheadPermit {
            shared: Arc::clone(&self.shared),
            _permit: permit,
        })
    }

    /// Runs `operation` if a permit is free, otherwise fails fast.
    ///
    /// If the operation succeeds but took longer than the configured timeout,
    /// [`BulkheadError::TimeoutExceeded`] is returned: the timeout is an SLA
    /// flag raised after completion, not a cancellation, and the operation's
    /// result is discarded.
    pub async fn execute<F, Fut, T, E>(
        &self,
        priority: Priority,
        operation: F,
    ) -> Result<T, BulkheadError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let timed = self.execute_timed(priority, operation).await?;
        if timed.exceeded {
            return Err(BulkheadError::TimeoutExceeded {
                name: self.shared.config.name.clone(),
                elapsed: timed.elapsed,
                timeout: self.shared.config.timeout,
            });
        }
        Ok(timed.value)
    }

    /// Runs `operation` like [`execute`](Self::execute) but hands back the
    /// result even when the budget was exceeded, together with the timing.
    pub async fn execute_timed<F, Fut, T, E>(
        &self,
        priority: Priority,
        operation: F,
    ) -> Result<Timed<T>, BulkheadError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = self.try_acquire(priority)?;
        let config = &self.shared.config;

        let start = tokio::time::Instant::now();
        let result = operation().await;
        let elapsed = start.elapsed();

        drop(permit);

        #[cfg(feature = "metrics")]
        histogram!("bulkhead_call_duration_seconds", "bulkhead" => config.name.clone())
            .record(elapsed.as_secs_f64());

        match result {
            Ok(value) => {
                config.event_listeners.emit(&BulkheadEvent::CallFinished {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    duration: elapsed,
                });

                #[cfg(feature = "metrics")]
                counter!("bulkhead_calls_finished_total", "bulkhead" => config.name.clone())
                    .increment(1);

                let exceeded = elapsed > config.timeout;
                if exceeded {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        bulkhead = %config.name,
                        ?elapsed,
                        timeout = ?config.timeout,
                        "call exceeded soft timeout"
                    );

                    #[cfg(feature = "metrics")]
                    counter!("bulkhead_timeouts_exceeded_total", "bulkhead" => config.name.clone())
                        .increment(1);

                    config.event_listeners.emit(&BulkheadEvent::TimeoutExceeded {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                        elapsed,
                        timeout: config.timeout,
                    });
                }

                Ok(Timed {
                    value,
                    elapsed,
                    exceeded,
                })
            }
            Err(error) => {
                config.event_listeners.emit(&BulkheadEvent::CallFailed {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    duration: elapsed,
                });

                #[cfg(feature = "metrics")]
                counter!("bulkhead_calls_failed_total", "bulkhead" => config.name.clone())
                    .increment(1);

                Err(BulkheadError::Operation(error))
            }
        }
    }

    /// Returns a snapshot of the bulkhead's counters without blocking.
    pub fn stats(&self) -> BulkheadStats {
        let shared = &self.shared;
        let active_calls = shared.active.load(Ordering::SeqCst);
        let max = shared.config.max_concurrent_calls;

        BulkheadStats {
            name: shared.config.name.clone(),
            active_calls,
            max_concurrent_calls: max,
            rejected_calls: shared.rejected.load(Ordering::SeqCst),
            utilization_percent: percent(active_calls, max),
        }
    }

    /// Calls currently in flight.
    pub fn active_calls(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Permits currently free.
    pub fn available_permits(&self) -> usize {
        self.shared.semaphore.available_permits()
    }

    /// Builds a Tower layer that guards services with this bulkhead.
    ///
    /// Every service produced by the layer shares this instance's permits.
    pub fn layer(&self) -> BulkheadLayer {
        BulkheadLayer::new(self.clone())
    }
}

impl fmt::Debug for Bulkhead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bulkhead")
            .field("name", &self.shared.config.name)
            .field("active_calls", &self.active_calls())
            .field("max_concurrent_calls", &self.shared.config.max_concurrent_calls)
            .finish()
    }
}

/// A held bulkhead slot.
///
/// Dropping the permit decrements the active count and then returns the
/// semaphore permit, so `active_calls` never exceeds the configured maximum.
pub struct BulkheadPermit {
    shared: Arc<Shared>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for BulkheadPermit {
    fn drop(&mut self) {
        let _remaining = self.shared.active.fetch_sub(1, Ordering::SeqCst) - 1;

        #[cfg(feature = "metrics")]
        gauge!("bulkhead_concurrent_calls", "bulkhead" => self.shared.config.name.clone())
            .set(_remaining as f64);
    }
}

impl fmt::Debug for BulkheadPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkheadPermit")
            .field("bulkhead", &self.shared.config.name)
            .finish()
    }
}
