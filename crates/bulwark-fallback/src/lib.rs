//! Ordered fallback chain over fixed degradation tiers.
//!
//! A [`FallbackChain`] binds at most one async handler to each
//! [`FallbackLevel`] and, on every call, tries the bound levels in this order:
//!
//! 1. `Primary`
//! 2. `Replica`
//! 3. `DistributedCache`
//! 4. `LocalCache`
//! 5. `BackupService`
//! 6. `Default`
//!
//! The first success wins and is returned with its provenance: the level that
//! served it and whether the result is degraded (anything but `Primary`).
//! When every bound level fails the error lists each attempt in order.
//!
//! # Example
//!
//! ```rust
//! use bulwark_fallback::{FallbackChain, FallbackLevel};
//!
//! # #[derive(Debug)]
//! # struct DbError;
//! # async fn example() {
//! let chain = FallbackChain::<u64, String, DbError>::builder()
//!     .name("user-profile")
//!     .handler(FallbackLevel::Primary, |_id: u64| async move {
//!         Err(DbError)
//!     })
//!     .handler(FallbackLevel::LocalCache, |id: u64| async move {
//!         Ok(format!("cached profile {}", id))
//!     })
//!     .value(FallbackLevel::Default, "anonymous".to_string())
//!     .on_level_failed(|level| eprintln!("{} failed", level))
//!     .build();
//!
//! match chain.execute(42).await {
//!     Ok(outcome) if outcome.degraded => {
//!         println!("served {} from {}", outcome.value, outcome.level);
//!     }
//!     Ok(outcome) => println!("served {}", outcome.value),
//!     Err(e) => eprintln!("{}", e),
//! }
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - `tracing` (default): warn on every failed level and on exhaustion
//! - `metrics`: counters for served levels, failed levels and exhaustion
//! - `serde`: (de)serialize [`FallbackLevel`] in snake case

mod chain;
mod config;
mod error;
mod events;
mod level;

pub use chain::{FallbackChain, FallbackOutcome, HandlerFn};
pub use config::FallbackChainBuilder;
pub use error::{FallbackError, LevelFailure};
pub use events::FallbackEvent;
pub use level::FallbackLevel;
