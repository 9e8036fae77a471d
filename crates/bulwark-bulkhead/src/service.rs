//! Bulkhead service implementation.

use crate::bulkhead::{Bulkhead, Priority};
use crate::error::BulkheadError;
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower_service::Service;

/// Tower service that runs each request under a [`Bulkhead`].
///
/// Rejections surface as [`BulkheadError::Full`] without calling the inner
/// service. The soft timeout only raises an event here; responses are never
/// discarded for running long.
#[derive(Clone, Debug)]
pub struct BulkheadService<S> {
    inner: S,
    bulkhead: Bulkhead,
    priority: Priority,
}

impl<S> BulkheadService<S> {
    pub(crate) fn new(inner: S, bulkhead: Bulkhead, priority: Priority) -> Self {
        Self {
            inner,
            bulkhead,
            priority,
        }
    }

    /// The bulkhead guarding this service.
    pub fn bulkhead(&self) -> &Bulkhead {
        &self.bulkhead
    }
}

impl<S, Request> Service<Request> for BulkheadService<S>
where
    S: Service<Request> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Request: Send + 'static,
{
    type Response = S::Response;
    type Error = BulkheadError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(BulkheadError::Operation)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let bulkhead = self.bulkhead.clone();
        let priority = self.priority;
        let mut inner = self.inner.clone();
        std::mem::swap(&mut self.inner, &mut inner);

        Box::pin(async move {
            bulkhead
                .execute_timed(priority, move || inner.call(request))
                .await
                .map(|timed| timed.value)
        })
    }
}
