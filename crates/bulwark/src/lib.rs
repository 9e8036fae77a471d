//! Bulkheads, rate limiters, adaptive timeouts and fallback chains.
//!
//! `bulwark` bundles the pattern crates and adds what ties them together for
//! a service protecting many downstream resources:
//!
//! - [`PolicyConfig`]: a serde-friendly description of the patterns guarding
//!   one named resource
//! - [`Registry`]: named pattern instances and a serializable
//!   [`RegistrySnapshot`] of their stats
//! - [`ResilientCall`]: rate limiter, then bulkhead, then the operation with
//!   its latency recorded, plus an optional [`FallbackChain`]
//!
//! # Patterns
//!
//! - **Bulkhead** ([`bulkhead`]): fail-fast concurrency cap per resource
//! - **Rate limiter** ([`ratelimiter`]): token bucket, sliding window, leaky
//!   bucket
//! - **Adaptive timeout** ([`timeout`]): bound derived from latency
//!   percentiles
//! - **Fallback chain** ([`fallback`]): ordered degradation tiers with
//!   provenance
//!
//! Every rejection and failure converts into [`ResilienceError`].
//!
//! # Example
//!
//! ```rust
//! use bulwark::{FallbackChain, FallbackLevel, PolicyConfig, Priority, Registry};
//! use bulwark::ratelimiter::RateLimitAlgorithm;
//! use bulwark::config::BulkheadSettings;
//!
//! # async fn example() {
//! let registry = Registry::new();
//! let call = registry
//!     .register_policy(
//!         &PolicyConfig::new("recommendations")
//!             .with_bulkhead(BulkheadSettings { max_concurrent_calls: 16, ..Default::default() })
//!             .with_rate_limiter(RateLimitAlgorithm::token_bucket(200, 100.0)),
//!     )
//!     .unwrap();
//!
//! let chain = FallbackChain::<u64, Vec<u64>, std::io::Error>::builder()
//!     .name("recommendations")
//!     .value(FallbackLevel::Default, vec![])
//!     .build();
//!
//! let outcome = call
//!     .call_with_fallback(Priority::Normal, &chain, 42, |user| async move {
//!         Ok(vec![user + 1, user + 2])
//!     })
//!     .await
//!     .unwrap();
//! assert!(!outcome.degraded);
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - `tracing`: structured logs from every pattern crate
//! - `metrics`: Prometheus-style metrics from every pattern crate

pub use bulwark_bulkhead as bulkhead;
pub use bulwark_core as core;
pub use bulwark_fallback as fallback;
pub use bulwark_ratelimiter as ratelimiter;
pub use bulwark_timeout as timeout;

mod call;
pub mod config;
pub mod registry;

pub use bulwark_bulkhead::Priority;
pub use bulwark_core::ResilienceError;
pub use bulwark_fallback::{FallbackChain, FallbackLevel, FallbackOutcome};
pub use call::ResilientCall;
pub use config::{BulkheadSettings, ConfigError, PolicyConfig, TimeoutSettings};
pub use registry::{Registry, RegistrySnapshot};
