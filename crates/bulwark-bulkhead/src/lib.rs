//! Bulkhead pattern: isolate resource pools so one slow dependency cannot
//! drain every worker.
//!
//! A [`Bulkhead`] holds a fixed number of permits. A call that finds a free
//! permit runs; a call that does not is rejected immediately with
//! [`BulkheadError::Full`]. There is no waiting queue. Each call also has a
//! soft execution budget: a call that completes after the budget elapsed is
//! reported, never interrupted.
//!
//! # Basic Example
//!
//! ```rust
//! use bulwark_bulkhead::{Bulkhead, BulkheadError, Priority};
//!
//! # async fn example() {
//! let bulkhead = Bulkhead::builder()
//!     .name("payments-api")
//!     .max_concurrent_calls(10)
//!     .timeout_ms(2_000)
//!     .build();
//!
//! match bulkhead
//!     .execute(Priority::High, || async { Ok::<_, std::io::Error>("charged") })
//!     .await
//! {
//!     Ok(receipt) => println!("{}", receipt),
//!     Err(BulkheadError::Full(full)) => eprintln!("shed: {}", full),
//!     Err(other) => eprintln!("failed: {}", other),
//! }
//! # }
//! ```
//!
//! # Example with Tower
//!
//! ```rust
//! use tower::ServiceBuilder;
//! use bulwark_bulkhead::Bulkhead;
//!
//! # async fn example() {
//! let bulkhead = Bulkhead::builder()
//!     .name("search-backend")
//!     .max_concurrent_calls(16)
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(bulkhead.layer())
//!     .service_fn(|req: String| async move { Ok::<_, ()>(req) });
//!
//! // The original handle still sees every call made through `service`.
//! println!("{:?}", bulkhead.stats());
//! # }
//! ```
//!
//! # Example with Event Listeners
//!
//! ```rust
//! use bulwark_bulkhead::Bulkhead;
//!
//! let bulkhead = Bulkhead::builder()
//!     .name("monitored")
//!     .max_concurrent_calls(4)
//!     .on_call_permitted(|concurrent, priority| {
//!         println!("permitted ({} in flight, {})", concurrent, priority);
//!     })
//!     .on_call_rejected(|active, max| {
//!         println!("rejected ({}/{})", active, max);
//!     })
//!     .on_timeout_exceeded(|elapsed, budget| {
//!         println!("slow call: {:?} > {:?}", elapsed, budget);
//!     })
//!     .build();
//! # let _ = bulkhead;
//! ```

pub mod bulkhead;
pub mod config;
pub mod error;
pub mod events;
pub mod layer;
pub mod service;

pub use bulkhead::{Bulkhead, BulkheadPermit, BulkheadStats, Priority, Timed};
pub use config::{BulkheadConfig, BulkheadConfigBuilder};
pub use error::{BulkheadError, BulkheadFull};
pub use events::BulkheadEvent;
pub use layer::BulkheadLayer;
pub use service::BulkheadService;
