//! Sliding window counter over exact admission timestamps.

use crate::{Admission, Decision};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Admits at most `limit` units within any trailing `window`.
///
/// Every admitted unit is remembered by timestamp, so unlike a fixed window
/// there is no edge where twice the limit gets through.
#[derive(Debug)]
pub struct SlidingWindow {
    limit: u32,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl SlidingWindow {
    /// Creates an empty window.
    ///
    /// # Panics
    ///
    /// Panics if `limit` or `window` is zero.
    pub fn new(limit: u32, window: Duration) -> Self {
        assert!(limit > 0, "sliding window limit must be greater than zero");
        assert!(!window.is_zero(), "sliding window window must be greater than zero");
        Self {
            limit,
            window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Maximum admissions per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Units still admissible right now.
    pub fn available(&self) -> u32 {
        let now = Instant::now();
        let timestamps = self.timestamps.lock().unwrap_or_else(PoisonError::into_inner);
        let live = timestamps
            .iter()
            .filter(|ts| now.saturating_duration_since(**ts) <= self.window)
            .count() as u32;
        self.limit.saturating_sub(live)
    }

    /// Forgets every admission.
    pub fn reset(&self) {
        self.timestamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn decide(&self, cost: u32) -> Decision {
        let now = Instant::now();
        let mut timestamps = self.timestamps.lock().unwrap_or_else(PoisonError::into_inner);

        while let Some(oldest) = timestamps.front() {
            if now.saturating_duration_since(*oldest) > self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        let live = timestamps.len() as u64;
        if live + u64::from(cost) <= u64::from(self.limit) {
            timestamps.extend(std::iter::repeat(now).take(cost as usize));
            let remaining = self.limit - timestamps.len() as u32;
            return Decision::admitted(remaining);
        }

        // The (excess)-th oldest entry has to roll out before `cost` fits.
        let retry_after = if cost > self.limit {
            None
        } else {
            let excess = (live + u64::from(cost) - u64::from(self.limit)) as usize;
            timestamps
                .get(excess - 1)
                .and_then(|ts| ts.checked_add(self.window))
                .map(|rollover| rollover.saturating_duration_since(now))
        };

        let remaining = self.limit.saturating_sub(live as u32);
        Decision::denied(remaining, retry_after)
    }
}

impl Admission for SlidingWindow {
    fn allow_n(&self, cost: u32) -> bool {
        self.decide(cost).admitted
    }
}
