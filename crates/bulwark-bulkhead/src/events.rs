//! Event types for the bulkhead.

use crate::Priority;
use bulwark_core::events::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by a bulkhead.
#[derive(Debug, Clone)]
pub enum BulkheadEvent {
    /// A call acquired a permit.
    CallPermitted {
        /// Name of the bulkhead instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Calls in flight, including this one.
        concurrent_calls: usize,
        /// Priority supplied by the caller.
        priority: Priority,
    },
    /// A call was rejected because every permit was taken.
    CallRejected {
        /// Name of the bulkhead instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Calls in flight at rejection time.
        active_calls: usize,
        /// Configured maximum.
        max_concurrent_calls: usize,
        /// Priority supplied by the caller.
        priority: Priority,
    },
    /// A call finished successfully.
    CallFinished {
        /// Name of the bulkhead instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Duration of the operation.
        duration: Duration,
    },
    /// The operation returned an error.
    CallFailed {
        /// Name of the bulkhead instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Duration of the operation.
        duration: Duration,
    },
    /// A completed call ran longer than the soft budget.
    TimeoutExceeded {
        /// Name of the bulkhead instance.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// How long the operation took.
        elapsed: Duration,
        /// The configured budget.
        timeout: Duration,
    },
}

impl ResilienceEvent for BulkheadEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BulkheadEvent::CallPermitted { .. } => "call_permitted",
            BulkheadEvent::CallRejected { .. } => "call_rejected",
            BulkheadEvent::CallFinished { .. } => "call_finished",
            BulkheadEvent::CallFailed { .. } => "call_failed",
            BulkheadEvent::TimeoutExceeded { .. } => "timeout_exceeded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BulkheadEvent::CallPermitted { timestamp, .. }
            | BulkheadEvent::CallRejected { timestamp, .. }
            | BulkheadEvent::CallFinished { timestamp, .. }
            | BulkheadEvent::CallFailed { timestamp, .. }
            | BulkheadEvent::TimeoutExceeded { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            BulkheadEvent::CallPermitted { pattern_name, .. }
            | BulkheadEvent::CallRejected { pattern_name, .. }
            | BulkheadEvent::CallFinished { pattern_name, .. }
            | BulkheadEvent::CallFailed { pattern_name, .. }
            | BulkheadEvent::TimeoutExceeded { pattern_name, .. } => pattern_name,
        }
    }
}
