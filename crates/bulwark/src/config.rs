//! Declarative per-resource policies.
//!
//! A [`PolicyConfig`] names one protected resource and the patterns guarding
//! it. Durations are plain milliseconds (or seconds for sliding windows) so
//! the same structure reads naturally from JSON, TOML or YAML.
//!
//! ```json
//! {
//!   "name": "payments-api",
//!   "bulkhead": { "max_concurrent_calls": 10, "timeout_ms": 2000 },
//!   "rate_limiter": { "algorithm": "token_bucket", "capacity": 100, "refill_rate": 50.0 },
//!   "timeout": { "request_timeout_ms": 5000, "min_samples": 50 }
//! }
//! ```

use bulwark_bulkhead::Bulkhead;
use bulwark_ratelimiter::{RateLimitAlgorithm, RateLimiter};
use bulwark_timeout::AdaptiveTimeout;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rejection of a policy that would not build.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The policy has an empty name.
    #[error("policy name must not be empty")]
    EmptyName,

    /// A numeric field is out of range.
    #[error("policy '{policy}': {field} {reason}")]
    Invalid {
        /// Name of the offending policy.
        policy: String,
        /// Dotted path of the field, e.g. `bulkhead.max_concurrent_calls`.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Bulkhead settings within a [`PolicyConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkheadSettings {
    /// Default: 25
    pub max_concurrent_calls: usize,
    /// Reserved; calls are never queued. Default: 0
    pub max_queue_size: usize,
    /// Soft execution budget. Default: 30000
    pub timeout_ms: u64,
    /// Default: false
    pub priority_enabled: bool,
}

impl Default for BulkheadSettings {
    fn default() -> Self {
        Self {
            max_concurrent_calls: 25,
            max_queue_size: 0,
            timeout_ms: 30_000,
            priority_enabled: false,
        }
    }
}

impl BulkheadSettings {
    /// Creates a bulkhead named `name` with these settings.
    pub fn build(&self, name: &str) -> Bulkhead {
        Bulkhead::builder()
            .name(name)
            .max_concurrent_calls(self.max_concurrent_calls)
            .max_queue_size(self.max_queue_size)
            .timeout_ms(self.timeout_ms)
            .priority_enabled(self.priority_enabled)
            .build()
    }

    fn validate(&self, policy: &str) -> Result<(), ConfigError> {
        if self.max_concurrent_calls == 0 {
            return Err(invalid(policy, "bulkhead.max_concurrent_calls", "must be greater than zero"));
        }
        if self.timeout_ms == 0 {
            return Err(invalid(policy, "bulkhead.timeout_ms", "must be greater than zero"));
        }
        Ok(())
    }
}

/// Adaptive timeout settings within a [`PolicyConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Default: 5000
    pub connection_timeout_ms: u64,
    /// Default: 30000
    pub read_timeout_ms: u64,
    /// Ceiling for the adaptive bound. Default: 30000
    pub request_timeout_ms: u64,
    /// Default: true
    pub adaptive_enabled: bool,
    /// Default: 1000
    pub history_size: usize,
    /// Default: 100
    pub min_samples: usize,
    /// Default: 1.5
    pub percentile_multiplier: f64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            connection_timeout_ms: 5_000,
            read_timeout_ms: 30_000,
            request_timeout_ms: 30_000,
            adaptive_enabled: true,
            history_size: 1000,
            min_samples: 100,
            percentile_multiplier: 1.5,
        }
    }
}

impl TimeoutSettings {
    /// Creates an adaptive timeout named `name` with these settings.
    pub fn build(&self, name: &str) -> AdaptiveTimeout {
        AdaptiveTimeout::builder()
            .name(name)
            .connection_timeout(Duration::from_millis(self.connection_timeout_ms))
            .read_timeout(Duration::from_millis(self.read_timeout_ms))
            .request_timeout_ms(self.request_timeout_ms)
            .adaptive_enabled(self.adaptive_enabled)
            .history_size(self.history_size)
            .min_samples(self.min_samples)
            .percentile_multiplier(self.percentile_multiplier)
            .build()
    }

    fn validate(&self, policy: &str) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(invalid(policy, "timeout.request_timeout_ms", "must be greater than zero"));
        }
        if self.history_size == 0 {
            return Err(invalid(policy, "timeout.history_size", "must be greater than zero"));
        }
        if self.min_samples > self.history_size {
            return Err(invalid(policy, "timeout.min_samples", "must not exceed history_size"));
        }
        if !(self.percentile_multiplier.is_finite() && self.percentile_multiplier > 0.0) {
            return Err(invalid(
                policy,
                "timeout.percentile_multiplier",
                "must be a positive, finite number",
            ));
        }
        Ok(())
    }
}

/// Everything that guards one named resource.
///
/// Every section is optional; an omitted section means that pattern is not
/// applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Resource name; becomes the name of every pattern instance built from
    /// this policy.
    pub name: String,
    /// Concurrency cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulkhead: Option<BulkheadSettings>,
    /// Admission rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limiter: Option<RateLimitAlgorithm>,
    /// Latency-derived timeout bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutSettings>,
}

impl PolicyConfig {
    /// A policy with no patterns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bulkhead: None,
            rate_limiter: None,
            timeout: None,
        }
    }

    /// Adds a bulkhead section.
    pub fn with_bulkhead(mut self, settings: BulkheadSettings) -> Self {
        self.bulkhead = Some(settings);
        self
    }

    /// Adds a rate limiter section.
    pub fn with_rate_limiter(mut self, algorithm: RateLimitAlgorithm) -> Self {
        self.rate_limiter = Some(algorithm);
        self
    }

    /// Adds an adaptive timeout section.
    pub fn with_timeout(mut self, settings: TimeoutSettings) -> Self {
        self.timeout = Some(settings);
        self
    }

    /// Checks every value the pattern builders would reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let policy = self.name.as_str();
        if policy.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if let Some(bulkhead) = &self.bulkhead {
            bulkhead.validate(policy)?;
        }
        if let Some(algorithm) = &self.rate_limiter {
            validate_algorithm(policy, algorithm)?;
        }
        if let Some(timeout) = &self.timeout {
            timeout.validate(policy)?;
        }
        Ok(())
    }

    /// Builds the rate limiter section, if any.
    pub fn build_rate_limiter(&self) -> Option<RateLimiter> {
        self.rate_limiter
            .as_ref()
            .map(|algorithm| RateLimiter::new(self.name.as_str(), algorithm.clone()))
    }
}

fn validate_algorithm(policy: &str, algorithm: &RateLimitAlgorithm) -> Result<(), ConfigError> {
    match *algorithm {
        RateLimitAlgorithm::TokenBucket {
            capacity,
            refill_rate,
            ..
        } => {
            if capacity == 0 {
                return Err(invalid(policy, "rate_limiter.capacity", "must be greater than zero"));
            }
            check_rate(policy, "rate_limiter.refill_rate", refill_rate)
        }
        RateLimitAlgorithm::SlidingWindow {
            limit,
            window_seconds,
        } => {
            if limit == 0 {
                return Err(invalid(policy, "rate_limiter.limit", "must be greater than zero"));
            }
            if !Duration::try_from_secs_f64(window_seconds).is_ok_and(|w| !w.is_zero()) {
                return Err(invalid(
                    policy,
                    "rate_limiter.window_seconds",
                    "must be a positive, finite number",
                ));
            }
            Ok(())
        }
        RateLimitAlgorithm::LeakyBucket {
            capacity,
            leak_rate,
            ..
        } => {
            if capacity == 0 {
                return Err(invalid(policy, "rate_limiter.capacity", "must be greater than zero"));
            }
            check_rate(policy, "rate_limiter.leak_rate", leak_rate)
        }
    }
}

fn check_rate(policy: &str, field: &'static str, rate: f64) -> Result<(), ConfigError> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(())
    } else {
        Err(invalid(policy, field, "must be a finite, non-negative number"))
    }
}

fn invalid(policy: &str, field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        policy: policy.to_string(),
        field,
        reason,
    }
}
