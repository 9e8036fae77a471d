use crate::limiter::RateLimiter;
use bulwark_core::ResilienceError;
use futures::future::{self, BoxFuture, TryFutureExt};
use std::task::{Context, Poll};
use tower_service::Service;

/// Service produced by [`RateLimiterLayer`](crate::RateLimiterLayer).
///
/// Denied requests fail with [`ResilienceError::RateLimited`] and never
/// reach the inner service; inner errors are wrapped in
/// [`ResilienceError::Application`].
#[derive(Clone, Debug)]
pub struct RateLimiterService<S> {
    inner: S,
    limiter: RateLimiter,
    cost: u32,
}

impl<S> RateLimiterService<S> {
    pub(crate) fn new(inner: S, limiter: RateLimiter, cost: u32) -> Self {
        Self {
            inner,
            limiter,
            cost,
        }
    }

    /// The limiter consulted by this service.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

impl<S, Request> Service<Request> for RateLimiterService<S>
where
    S: Service<Request>,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = S::Response;
    type Error = ResilienceError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(ResilienceError::Application)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        match self.limiter.check(self.cost) {
            Ok(()) => Box::pin(self.inner.call(request).map_err(ResilienceError::Application)),
            Err(denied) => Box::pin(future::ready(Err(denied.into()))),
        }
    }
}
