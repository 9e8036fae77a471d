//! Fallback chain integration tests.
//!
//! - ordering.rs: level order, provenance and exhaustion
//! - runtime.rs: registration after construction and listeners
//! - concurrency.rs: concurrent executions on one shared chain

mod ordering;
mod runtime;
