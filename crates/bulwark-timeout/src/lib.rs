//! Adaptive timeout: a per-resource timeout bound recomputed from recent
//! latency percentiles.
//!
//! Record the latency of each call; once enough samples exist the
//! recommended bound becomes `p95 * 1.5`, capped at the static request
//! timeout. The component never rejects or cancels anything on its own.
//!
//! ```rust
//! use bulwark_timeout::AdaptiveTimeout;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let timeout = AdaptiveTimeout::builder()
//!     .name("pricing-api")
//!     .request_timeout(Duration::from_secs(5))
//!     .build();
//!
//! // Measure only.
//! let (price, elapsed) = timeout.observe(async { 42 }).await;
//! if elapsed > timeout.timeout() {
//!     eprintln!("slow pricing call: {:?}", elapsed);
//! }
//!
//! // Or enforce the current bound.
//! match timeout.run_with_deadline(async { price }).await {
//!     Ok(p) => println!("price {}", p),
//!     Err(e) => eprintln!("{}", e),
//! }
//!
//! println!("{:?}", timeout.stats());
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod timeout;

pub use config::{AdaptiveTimeoutConfig, AdaptiveTimeoutConfigBuilder};
pub use error::TimeoutError;
pub use events::TimeoutEvent;
pub use timeout::{AdaptiveTimeout, TimeoutStats};
