//! Leaky bucket: a bounded queue drained at a constant rate.

use crate::algorithm::Accrual;
use crate::{Admission, Decision};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct LeakState {
    occupancy: VecDeque<Instant>,
    last_leak: Instant,
}

/// A leaky bucket.
///
/// Models a constant-rate processor in front of a queue of `capacity` slots.
/// Each decision first drains the units the processor would have finished
/// since the last decision, oldest first, then admits iff `cost` more units
/// fit. A denial never changes occupancy.
#[derive(Debug)]
pub struct LeakyBucket {
    capacity: u32,
    leak_rate: f64,
    accrual: Accrual,
    state: Mutex<LeakState>,
}

impl LeakyBucket {
    /// Creates an empty bucket.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or `leak_rate` is negative or not finite.
    pub fn new(capacity: u32, leak_rate: f64) -> Self {
        assert!(capacity > 0, "leaky bucket capacity must be greater than zero");
        assert!(
            leak_rate.is_finite() && leak_rate >= 0.0,
            "leaky bucket leak_rate must be a finite, non-negative number"
        );

        Self {
            capacity,
            leak_rate,
            accrual: Accrual::Truncating,
            state: Mutex::new(LeakState {
                occupancy: VecDeque::new(),
                last_leak: Instant::now(),
            }),
        }
    }

    /// Sets the accrual mode.
    pub fn with_accrual(mut self, accrual: Accrual) -> Self {
        self.accrual = accrual;
        self
    }

    /// Maximum occupancy.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Units drained per second.
    pub fn leak_rate(&self) -> f64 {
        self.leak_rate
    }

    /// The configured accrual mode.
    pub fn accrual(&self) -> Accrual {
        self.accrual
    }

    /// Units currently queued, as of the last decision.
    pub fn occupancy(&self) -> u32 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.occupancy.len() as u32
    }

    /// Free slots a decision made now would see.
    pub fn available(&self) -> u32 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let queued = state.occupancy.len();
        let drained = self.leakable(Instant::now(), state.last_leak).min(queued);
        self.capacity - (queued - drained) as u32
    }

    /// Empties the bucket.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.occupancy.clear();
        state.last_leak = Instant::now();
    }

    fn leakable(&self, now: Instant, since: Instant) -> usize {
        let units = now.saturating_duration_since(since).as_secs_f64() * self.leak_rate;
        units.floor() as usize
    }

    fn leak(&self, state: &mut LeakState, now: Instant) {
        let leaked = self
            .leakable(now, state.last_leak)
            .min(state.occupancy.len());
        state.occupancy.drain(..leaked);

        state.last_leak = match self.accrual {
            Accrual::Truncating => now,
            Accrual::Fractional if state.occupancy.is_empty() => now,
            Accrual::Fractional => {
                // Advance only by the time the drained units account for.
                let spent = Duration::try_from_secs_f64(leaked as f64 / self.leak_rate)
                    .unwrap_or(Duration::ZERO);
                (state.last_leak + spent).min(now)
            }
        };
    }

    pub(crate) fn decide(&self, cost: u32) -> Decision {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.leak(&mut state, now);

        let queued = state.occupancy.len() as u64;
        if queued + u64::from(cost) <= u64::from(self.capacity) {
            state
                .occupancy
                .extend(std::iter::repeat(now).take(cost as usize));
            let remaining = self.capacity - state.occupancy.len() as u32;
            return Decision::admitted(remaining);
        }

        let retry_after = if cost > self.capacity || self.leak_rate == 0.0 {
            None
        } else {
            let excess = queued + u64::from(cost) - u64::from(self.capacity);
            Duration::try_from_secs_f64(excess as f64 / self.leak_rate).ok()
        };

        let remaining = self.capacity - queued as u32;
        Decision::denied(remaining, retry_after)
    }
}

impl Admission for LeakyBucket {
    fn allow_n(&self, cost: u32) -> bool {
        self.decide(cost).admitted
    }
}
