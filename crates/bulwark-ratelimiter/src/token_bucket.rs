//! Token bucket: bursts up to capacity, sustained rate bounded by refill.

use crate::algorithm::Accrual;
use crate::{Admission, Decision};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct TokenState {
    tokens: f64,
    last_refill: Instant,
}

/// A token bucket.
///
/// Starts full. Each decision first credits tokens for the time elapsed since
/// the last decision (capped at `capacity`), then admits iff at least `cost`
/// tokens are present and deducts them.
///
/// ```rust
/// use bulwark_ratelimiter::{Admission, TokenBucket};
///
/// let bucket = TokenBucket::new(3, 1.0);
/// assert!(bucket.allow());
/// assert!(bucket.allow_n(2));
/// assert!(!bucket.allow());
/// ```
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    refill_rate: f64,
    accrual: Accrual,
    state: Mutex<TokenState>,
}

impl TokenBucket {
    /// Creates a full bucket.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or `refill_rate` is negative or not
    /// finite.
    pub fn new(capacity: u32, refill_rate: f64) -> Self {
        assert!(capacity > 0, "token bucket capacity must be greater than zero");
        assert!(
            refill_rate.is_finite() && refill_rate >= 0.0,
            "token bucket refill_rate must be a finite, non-negative number"
        );

        Self {
            capacity,
            refill_rate,
            accrual: Accrual::Truncating,
            state: Mutex::new(TokenState {
                tokens: f64::from(capacity),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Sets the accrual mode.
    pub fn with_accrual(mut self, accrual: Accrual) -> Self {
        self.accrual = accrual;
        self
    }

    /// Maximum tokens held.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Tokens added per second.
    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    /// The configured accrual mode.
    pub fn accrual(&self) -> Accrual {
        self.accrual
    }

    /// Whole tokens that a decision made now would see, without consuming.
    pub fn available(&self) -> u32 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let tokens = state.tokens + self.credit(Instant::now(), state.last_refill);
        tokens.min(f64::from(self.capacity)).floor() as u32
    }

    /// Refills the bucket to capacity.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.tokens = f64::from(self.capacity);
        state.last_refill = Instant::now();
    }

    fn credit(&self, now: Instant, since: Instant) -> f64 {
        let earned = now.saturating_duration_since(since).as_secs_f64() * self.refill_rate;
        match self.accrual {
            Accrual::Truncating => earned.floor(),
            Accrual::Fractional => earned,
        }
    }

    pub(crate) fn decide(&self, cost: u32) -> Decision {
        let now = Instant::now();
        let capacity = f64::from(self.capacity);
        let cost_f = f64::from(cost);

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let credit = self.credit(now, state.last_refill);
        state.tokens = (state.tokens + credit).min(capacity);
        state.last_refill = now;

        if state.tokens >= cost_f {
            state.tokens -= cost_f;
            return Decision::admitted(state.tokens.floor() as u32);
        }

        let retry_after = if cost > self.capacity || self.refill_rate == 0.0 {
            None
        } else {
            let deficit = cost_f - state.tokens;
            let deficit = match self.accrual {
                Accrual::Truncating => deficit.ceil(),
                Accrual::Fractional => deficit,
            };
            Duration::try_from_secs_f64(deficit / self.refill_rate).ok()
        };

        Decision::denied(state.tokens.floor() as u32, retry_after)
    }
}

impl Admission for TokenBucket {
    fn allow_n(&self, cost: u32) -> bool {
        self.decide(cost).admitted
    }
}
