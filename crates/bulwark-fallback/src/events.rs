//! Events emitted by the fallback chain.

use crate::FallbackLevel;
use bulwark_core::ResilienceEvent;
use std::time::Instant;

/// Events emitted by a [`FallbackChain`](crate::FallbackChain).
#[derive(Debug, Clone)]
pub enum FallbackEvent {
    /// A bound level's handler returned an error.
    LevelFailed {
        /// Name of the chain.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// The level that failed.
        level: FallbackLevel,
    },

    /// A level produced the result.
    Served {
        /// Name of the chain.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// The level that served.
        level: FallbackLevel,
        /// `true` unless `level` is `Primary`.
        degraded: bool,
    },

    /// Every bound level failed.
    Exhausted {
        /// Name of the chain.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Number of levels attempted.
        attempts: usize,
    },
}

impl ResilienceEvent for FallbackEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::LevelFailed { .. } => "level_failed",
            Self::Served { .. } => "served",
            Self::Exhausted { .. } => "exhausted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::LevelFailed { timestamp, .. }
            | Self::Served { timestamp, .. }
            | Self::Exhausted { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            Self::LevelFailed { pattern_name, .. }
            | Self::Served { pattern_name, .. }
            | Self::Exhausted { pattern_name, .. } => pattern_name,
        }
    }
}
