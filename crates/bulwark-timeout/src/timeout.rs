//! Rolling latency history and the bound derived from it.

use crate::config::AdaptiveTimeoutConfig;
use crate::error::TimeoutError;
use crate::events::TimeoutEvent;
use bulwark_core::round2;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

#[cfg(feature = "metrics")]
static METRICS_INIT: std::sync::Once = std::sync::Once::new();

/// Percentiles are not recomputed on fewer samples than this.
const PERCENTILE_MIN_SAMPLES: usize = 10;

/// p99.9 is only distinguished from p99 at this many samples.
const P999_MIN_SAMPLES: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Percentiles {
    p50: f64,
    p95: f64,
    p99: f64,
    p999: f64,
}

impl Percentiles {
    fn from_history(history: &VecDeque<f64>) -> Self {
        let mut sorted: Vec<f64> = history.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let p99 = percentile(&sorted, 0.99);
        let p999 = if sorted.len() >= P999_MIN_SAMPLES {
            percentile(&sorted, 0.999)
        } else {
            p99
        };

        Self {
            p50: percentile(&sorted, 0.50),
            p95: percentile(&sorted, 0.95),
            p99,
            p999,
        }
    }
}

/// Value at index `min(floor(n * q), n - 1)` of an ascending slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n => sorted[((n as f64 * q).floor() as usize).min(n - 1)],
    }
}

#[derive(Debug, Default)]
struct LatencyState {
    history: VecDeque<f64>,
    percentiles: Percentiles,
}

/// Snapshot of an adaptive timeout for health endpoints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TimeoutStats {
    /// Whether adaptation is enabled.
    pub enabled: bool,
    /// The bound `timeout_ms()` returns right now.
    pub timeout_ms: u64,
    /// Median latency in milliseconds.
    pub p50: f64,
    /// 95th percentile in milliseconds.
    pub p95: f64,
    /// 99th percentile in milliseconds.
    pub p99: f64,
    /// 99.9th percentile in milliseconds.
    pub p999: f64,
    /// Samples currently retained.
    pub sample_count: usize,
}

struct Shared {
    config: AdaptiveTimeoutConfig,
    state: RwLock<LatencyState>,
}

/// Derives a timeout bound from recently observed latencies.
///
/// Until `min_samples` latencies have been recorded (or when adaptation is
/// disabled) the bound is the static `request_timeout`. Afterwards it is
/// `min(p95 * percentile_multiplier, request_timeout)`, so it can only
/// tighten.
///
/// The component only measures: [`observe`](Self::observe) and
/// [`record_latency`](Self::record_latency) never interrupt anything.
/// [`run_with_deadline`](Self::run_with_deadline) is the separate, opt-in way
/// to enforce the bound.
///
/// # Example
///
/// ```rust
/// use bulwark_timeout::AdaptiveTimeout;
/// use std::time::Duration;
///
/// let timeout = AdaptiveTimeout::builder()
///     .name("catalog-db")
///     .request_timeout(Duration::from_secs(2))
///     .min_samples(20)
///     .build();
///
/// assert_eq!(timeout.timeout(), Duration::from_secs(2));
///
/// for _ in 0..20 {
///     timeout.record_latency(Duration::from_millis(40));
/// }
/// assert_eq!(timeout.timeout_ms(), 60);
/// ```
#[derive(Clone)]
pub struct AdaptiveTimeout {
    shared: Arc<Shared>,
}

impl AdaptiveTimeout {
    /// Creates an adaptive timeout with an empty history.
    pub fn new(config: AdaptiveTimeoutConfig) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_gauge!(
                "adaptive_timeout_ms",
                "Current timeout bound in milliseconds"
            );
            describe_histogram!(
                "adaptive_timeout_latency_seconds",
                "Latencies recorded by the adaptive timeout"
            );
            describe_counter!(
                "adaptive_timeout_deadlines_elapsed_total",
                "Futures dropped by run_with_deadline"
            );
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(
            timeout = %config.name,
            request_timeout = ?config.request_timeout,
            adaptive_enabled = config.adaptive_enabled,
            history_size = config.history_size,
            "adaptive timeout created"
        );

        let history = VecDeque::new();
        Self {
            shared: Arc::new(Shared {
                config,
                state: RwLock::new(LatencyState {
                    history,
                    percentiles: Percentiles::default(),
                }),
            }),
        }
    }

    /// Creates a new configuration builder.
    pub fn builder() -> crate::AdaptiveTimeoutConfigBuilder {
        crate::AdaptiveTimeoutConfigBuilder::new()
    }

    /// The configuration.
    pub fn config(&self) -> &AdaptiveTimeoutConfig {
        &self.shared.config
    }

    /// Name of the protected resource.
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// Static connection timeout.
    pub fn connection_timeout(&self) -> Duration {
        self.shared.config.connection_timeout
    }

    /// Static read timeout.
    pub fn read_timeout(&self) -> Duration {
        self.shared.config.read_timeout
    }

    /// Records one latency sample.
    pub fn record_latency(&self, latency: Duration) {
        self.record_latency_ms(latency.as_secs_f64() * 1000.0);
    }

    /// Records one latency sample in milliseconds.
    ///
    /// Negative and non-finite values are ignored.
    pub fn record_latency_ms(&self, latency_ms: f64) {
        let config = &self.shared.config;
        if !latency_ms.is_finite() || latency_ms < 0.0 {
            #[cfg(feature = "tracing")]
            tracing::debug!(timeout = %config.name, latency_ms, "ignoring invalid latency sample");
            return;
        }

        let (previous, current, sample_count) = {
            let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
            let previous = self.bound_ms(&state);

            if state.history.len() >= config.history_size {
                state.history.pop_front();
            }
            state.history.push_back(latency_ms);

            if state.history.len() >= PERCENTILE_MIN_SAMPLES {
                state.percentiles = Percentiles::from_history(&state.history);
            }

            (previous, self.bound_ms(&state), state.history.len())
        };

        #[cfg(feature = "metrics")]
        {
            histogram!("adaptive_timeout_latency_seconds", "timeout" => config.name.clone())
                .record(latency_ms / 1000.0);
            gauge!("adaptive_timeout_ms", "timeout" => config.name.clone()).set(current as f64);
        }

        if previous != current {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                timeout = %config.name,
                previous_ms = previous,
                current_ms = current,
                sample_count,
                "timeout bound adjusted"
            );

            config.event_listeners.emit(&TimeoutEvent::TimeoutAdjusted {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                previous: Duration::from_millis(previous),
                current: Duration::from_millis(current),
                sample_count,
            });
        }
    }

    /// The bound in milliseconds.
    pub fn timeout_ms(&self) -> u64 {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        self.bound_ms(&state)
    }

    /// The bound as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms())
    }

    /// Number of samples currently retained.
    pub fn sample_count(&self) -> usize {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        state.history.len()
    }

    /// Returns the current bound and percentiles, rounded to two decimals.
    pub fn stats(&self) -> TimeoutStats {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        let p = state.percentiles;
        TimeoutStats {
            enabled: self.shared.config.adaptive_enabled,
            timeout_ms: self.bound_ms(&state),
            p50: round2(p.p50),
            p95: round2(p.p95),
            p99: round2(p.p99),
            p999: round2(p.p999),
            sample_count: state.history.len(),
        }
    }

    /// Clears the history; the bound returns to the static ceiling.
    pub fn reset(&self) {
        {
            let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
            state.history.clear();
            state.percentiles = Percentiles::default();
        }

        let config = &self.shared.config;

        #[cfg(feature = "tracing")]
        tracing::debug!(timeout = %config.name, "latency history reset");

        config.event_listeners.emit(&TimeoutEvent::Reset {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
        });
    }

    /// Runs `future` to completion, records how long it took and returns the
    /// output with the elapsed time.
    ///
    /// Nothing is interrupted: compare `elapsed` with [`timeout`](Self::timeout)
    /// to flag a slow call.
    pub async fn observe<F>(&self, future: F) -> (F::Output, Duration)
    where
        F: Future,
    {
        let start = tokio::time::Instant::now();
        let output = future.await;
        let elapsed = start.elapsed();
        self.record_latency(elapsed);
        (output, elapsed)
    }

    /// Runs `future` under the current bound, dropping it if the bound
    /// elapses first.
    ///
    /// Completed runs are recorded at their elapsed time. Expired runs are
    /// recorded at the bound they exceeded, so a bound that is too tight
    /// widens again instead of rejecting every later run.
    pub async fn run_with_deadline<F>(&self, future: F) -> Result<F::Output, TimeoutError>
    where
        F: Future,
    {
        let bound = self.timeout();
        let start = tokio::time::Instant::now();

        match tokio::time::timeout(bound, future).await {
            Ok(output) => {
                self.record_latency(start.elapsed());
                Ok(output)
            }
            Err(_) => {
                self.record_latency(bound);
                let config = &self.shared.config;

                #[cfg(feature = "tracing")]
                tracing::debug!(timeout = %config.name, bound = ?bound, "deadline elapsed");

                #[cfg(feature = "metrics")]
                counter!("adaptive_timeout_deadlines_elapsed_total", "timeout" => config.name.clone())
                    .increment(1);

                config.event_listeners.emit(&TimeoutEvent::DeadlineElapsed {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    timeout: bound,
                });

                Err(TimeoutError::Elapsed {
                    name: config.name.clone(),
                    timeout: bound,
                })
            }
        }
    }

    fn bound_ms(&self, state: &LatencyState) -> u64 {
        let config = &self.shared.config;
        let ceiling = u64::try_from(config.request_timeout.as_millis()).unwrap_or(u64::MAX);
        let required = config.min_samples.max(PERCENTILE_MIN_SAMPLES);

        if !config.adaptive_enabled || state.history.len() < required {
            return ceiling;
        }

        // Rounded up and kept at 1 ms or more: a zero bound expires every run.
        let adaptive = (state.percentiles.p95 * config.percentile_multiplier).ceil();
        (adaptive.min(ceiling as f64) as u64).max(1)
    }
}

impl fmt::Debug for AdaptiveTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveTimeout")
            .field("name", &self.shared.config.name)
            .field("timeout_ms", &self.timeout_ms())
            .field("sample_count", &self.sample_count())
            .finish()
    }
}
