//! Admission control by rate: token bucket, sliding window and leaky bucket.
//!
//! The three algorithms answer one question, "may this request run right
//! now?", and differ in how they treat bursts:
//!
//! - [`TokenBucket`] allows a burst of up to `capacity`, then a sustained
//!   `refill_rate` per second.
//! - [`SlidingWindow`] allows at most `limit` requests in any trailing window,
//!   with no doubling at window edges.
//! - [`LeakyBucket`] models a bounded queue drained at a constant rate.
//!
//! Each can be used directly through the [`Admission`] trait, or wrapped in a
//! named [`RateLimiter`] that adds errors with retry hints, stats, events and
//! a Tower layer. Decisions never sleep and never retry.
//!
//! # Example
//!
//! ```rust
//! use bulwark_ratelimiter::{RateLimitError, RateLimiter};
//!
//! let limiter = RateLimiter::builder()
//!     .name("checkout")
//!     .token_bucket(5, 5.0)
//!     .on_denied(|cost, retry_after| {
//!         println!("denied cost {} (retry after {:?})", cost, retry_after);
//!     })
//!     .build();
//!
//! for _ in 0..5 {
//!     assert!(limiter.check(1).is_ok());
//! }
//! match limiter.check(1) {
//!     Err(RateLimitError::Exceeded { retry_after, .. }) => assert!(retry_after.is_some()),
//!     Ok(()) => unreachable!("bucket is empty"),
//! }
//! ```
//!
//! # Accrual
//!
//! Elapsed time is converted to whole tokens (or leaked units) with
//! `floor(elapsed * rate)` and the clock restarts on every decision. At rates
//! below one unit per inter-arrival gap this can stall a bucket indefinitely.
//! [`Accrual::Fractional`] keeps the sub-unit remainder instead.
//!
//! # Time
//!
//! All algorithms read [`tokio::time::Instant`], so tests can drive them with
//! a paused clock and `tokio::time::advance`.

mod algorithm;
mod config;
mod error;
mod events;
mod layer;
mod leaky_bucket;
mod limiter;
mod service;
mod sliding_window;
mod token_bucket;

pub use algorithm::{Accrual, RateLimitAlgorithm};
pub use config::{RateLimiterConfig, RateLimiterConfigBuilder};
pub use error::RateLimitError;
pub use events::RateLimiterEvent;
pub use layer::RateLimiterLayer;
pub use leaky_bucket::LeakyBucket;
pub use limiter::{RateLimiter, RateLimiterStats};
pub use service::RateLimiterService;
pub use sliding_window::SlidingWindow;
pub use token_bucket::TokenBucket;

use std::time::Duration;

/// A non-blocking admission decision.
pub trait Admission: Send + Sync {
    /// Admits a request of cost 1.
    fn allow(&self) -> bool {
        self.allow_n(1)
    }

    /// Admits a request consuming `cost` units, or denies it without side
    /// effects on capacity.
    fn allow_n(&self, cost: u32) -> bool;
}

/// Outcome of one decision, computed under the algorithm's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Decision {
    pub(crate) admitted: bool,
    pub(crate) remaining: u32,
    pub(crate) retry_after: Option<Duration>,
}

impl Decision {
    pub(crate) fn admitted(remaining: u32) -> Self {
        Self {
            admitted: true,
            remaining,
            retry_after: None,
        }
    }

    pub(crate) fn denied(remaining: u32, retry_after: Option<Duration>) -> Self {
        Self {
            admitted: false,
            remaining,
            retry_after,
        }
    }
}
