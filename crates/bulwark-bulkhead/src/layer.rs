//! Tower layer implementation for bulkhead.

use crate::bulkhead::{Bulkhead, Priority};
use crate::service::BulkheadService;
use tower_layer::Layer;

/// Layer that guards services with a shared [`Bulkhead`].
///
/// All services produced by one layer draw from the same permits, so a
/// bulkhead can protect a downstream resource used by several clients.
#[derive(Clone, Debug)]
pub struct BulkheadLayer {
    bulkhead: Bulkhead,
    priority: Priority,
}

impl BulkheadLayer {
    /// Creates a layer around an existing bulkhead.
    pub fn new(bulkhead: Bulkhead) -> Self {
        Self {
            bulkhead,
            priority: Priority::Normal,
        }
    }

    /// Sets the priority reported for every request through this layer.
    ///
    /// # Examples
    ///
    /// ```
    /// use bulwark_bulkhead::{Bulkhead, Priority};
    ///
    /// let layer = Bulkhead::builder()
    ///     .name("reports")
    ///     .max_concurrent_calls(4)
    ///     .build()
    ///     .layer()
    ///     .with_priority(Priority::Low);
    /// # let _ = layer;
    /// ```
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// The bulkhead shared by every wrapped service.
    pub fn bulkhead(&self) -> &Bulkhead {
        &self.bulkhead
    }
}

impl<S> Layer<S> for BulkheadLayer {
    type Service = BulkheadService<S>;

    fn layer(&self, service: S) -> Self::Service {
        BulkheadService::new(service, self.bulkhead.clone(), self.priority)
    }
}
