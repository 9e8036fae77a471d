use bulwark_core::events::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by a [`RateLimiter`](crate::RateLimiter).
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    /// A request was admitted.
    Admitted {
        pattern_name: String,
        timestamp: Instant,
        cost: u32,
        remaining: u32,
    },
    /// A request was denied.
    Denied {
        pattern_name: String,
        timestamp: Instant,
        cost: u32,
        retry_after: Option<Duration>,
    },
    /// The limiter was reset to full capacity.
    Reset {
        pattern_name: String,
        timestamp: Instant,
    },
}

impl ResilienceEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RateLimiterEvent::Admitted { .. } => "admitted",
            RateLimiterEvent::Denied { .. } => "denied",
            RateLimiterEvent::Reset { .. } => "reset",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RateLimiterEvent::Admitted { timestamp, .. } => *timestamp,
            RateLimiterEvent::Denied { timestamp, .. } => *timestamp,
            RateLimiterEvent::Reset { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            RateLimiterEvent::Admitted { pattern_name, .. } => pattern_name,
            RateLimiterEvent::Denied { pattern_name, .. } => pattern_name,
            RateLimiterEvent::Reset { pattern_name, .. } => pattern_name,
        }
    }
}
