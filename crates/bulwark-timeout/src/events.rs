//! Event types for the adaptive timeout.

use bulwark_core::events::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by an [`AdaptiveTimeout`](crate::AdaptiveTimeout).
#[derive(Debug, Clone)]
pub enum TimeoutEvent {
    /// A recorded sample moved the computed bound.
    TimeoutAdjusted {
        pattern_name: String,
        timestamp: Instant,
        previous: Duration,
        current: Duration,
        sample_count: usize,
    },
    /// A future run under the current bound did not finish in time.
    DeadlineElapsed {
        pattern_name: String,
        timestamp: Instant,
        timeout: Duration,
    },
    /// The latency history was cleared.
    Reset {
        pattern_name: String,
        timestamp: Instant,
    },
}

impl ResilienceEvent for TimeoutEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TimeoutEvent::TimeoutAdjusted { .. } => "timeout_adjusted",
            TimeoutEvent::DeadlineElapsed { .. } => "deadline_elapsed",
            TimeoutEvent::Reset { .. } => "reset",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            TimeoutEvent::TimeoutAdjusted { timestamp, .. }
            | TimeoutEvent::DeadlineElapsed { timestamp, .. }
            | TimeoutEvent::Reset { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            TimeoutEvent::TimeoutAdjusted { pattern_name, .. }
            | TimeoutEvent::DeadlineElapsed { pattern_name, .. }
            | TimeoutEvent::Reset { pattern_name, .. } => pattern_name,
        }
    }
}
