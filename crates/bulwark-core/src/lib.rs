//! Core infrastructure for bulwark.
//!
//! This crate provides functionality shared by every bulwark pattern crate:
//! - Event system for observability
//! - [`ResilienceError`], the unified error type the patterns convert into
//! - Small numeric helpers used by the stats snapshots

pub mod error;
pub mod events;
pub mod stats;

pub use error::ResilienceError;
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
pub use stats::{percent, round2};
