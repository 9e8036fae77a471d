//! Composition of the patterns guarding one resource.

use bulwark_bulkhead::{Bulkhead, BulkheadError, Priority};
use bulwark_core::ResilienceError;
use bulwark_fallback::{FallbackChain, FallbackError, FallbackLevel, FallbackOutcome};
use bulwark_ratelimiter::RateLimiter;
use bulwark_timeout::AdaptiveTimeout;
use std::fmt;
use std::future::Future;

/// Runs operations through the patterns configured for one resource.
///
/// Order per call:
///
/// 1. the rate limiter admits or denies (denial never touches the bulkhead)
/// 2. the bulkhead takes a permit or rejects
/// 3. the operation runs, timed by the adaptive timeout if one is set
///
/// Every stage is optional. Cloning is cheap; clones share all state.
///
/// # Example
///
/// ```rust
/// use bulwark::{Priority, ResilientCall};
/// use bulwark::bulkhead::Bulkhead;
/// use bulwark::ratelimiter::{RateLimitAlgorithm, RateLimiter};
///
/// # async fn example() {
/// let call = ResilientCall::new("inventory")
///     .with_rate_limiter(RateLimiter::new(
///         "inventory",
///         RateLimitAlgorithm::token_bucket(100, 50.0),
///     ))
///     .with_bulkhead(Bulkhead::builder().name("inventory").max_concurrent_calls(8).build());
///
/// let stock = call
///     .call(Priority::Normal, || async { Ok::<_, std::io::Error>(12u32) })
///     .await
///     .unwrap();
/// assert_eq!(stock, 12);
/// # }
/// ```
#[derive(Clone)]
pub struct ResilientCall {
    name: String,
    rate_limiter: Option<RateLimiter>,
    bulkhead: Option<Bulkhead>,
    timeout: Option<AdaptiveTimeout>,
    cost: u32,
    enforce_deadline: bool,
}

impl ResilientCall {
    /// A call with no patterns; operations pass straight through.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rate_limiter: None,
            bulkhead: None,
            timeout: None,
            cost: 1,
            enforce_deadline: false,
        }
    }

    /// Gates calls on `limiter`.
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Caps concurrency with `bulkhead`.
    pub fn with_bulkhead(mut self, bulkhead: Bulkhead) -> Self {
        self.bulkhead = Some(bulkhead);
        self
    }

    /// Records every call's latency in `timeout`.
    pub fn with_adaptive_timeout(mut self, timeout: AdaptiveTimeout) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Units each call consumes from the rate limiter.
    ///
    /// Default: 1
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// Drops operations that outlive the adaptive bound and fails them with
    /// [`ResilienceError::Timeout`].
    ///
    /// Without this the bound is advisory: it is measured and reported but
    /// never enforced. Has no effect without an adaptive timeout.
    ///
    /// Default: false
    pub fn enforce_deadline(mut self, enforce: bool) -> Self {
        self.enforce_deadline = enforce;
        self
    }

    /// Name of the guarded resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rate limiter, if any.
    pub fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.rate_limiter.as_ref()
    }

    /// The bulkhead, if any.
    pub fn bulkhead(&self) -> Option<&Bulkhead> {
        self.bulkhead.as_ref()
    }

    /// The adaptive timeout, if any.
    pub fn adaptive_timeout(&self) -> Option<&AdaptiveTimeout> {
        self.timeout.as_ref()
    }

    /// Runs `operation` through every configured pattern.
    ///
    /// Rejections (`RateLimited`, `BulkheadFull`) mean the operation never
    /// ran. Only calls that ran are recorded in the adaptive timeout.
    pub async fn call<F, Fut, T, E>(
        &self,
        priority: Priority,
        operation: F,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(limiter) = &self.rate_limiter {
            limiter.check(self.cost)?;
        }

        let timeout = self.timeout.as_ref();
        let enforce = self.enforce_deadline;
        let measured = move || async move {
            let future = operation();
            match timeout {
                Some(t) if enforce => match t.run_with_deadline(future).await {
                    Ok(result) => result.map_err(ResilienceError::Application),
                    Err(elapsed) => Err(elapsed.into()),
                },
                Some(t) => t.observe(future).await.0.map_err(ResilienceError::Application),
                None => future.await.map_err(ResilienceError::Application),
            }
        };

        match &self.bulkhead {
            Some(bulkhead) => bulkhead
                .execute_timed(priority, measured)
                .await
                .map(|timed| timed.value)
                .map_err(flatten),
            None => measured().await,
        }
    }

    /// Runs `primary` like [`call`](Self::call) and, if it fails for any
    /// reason, serves the request from `chain` instead.
    ///
    /// The guarded call stands in for the `Primary` level, so the chain is
    /// consulted from `Replica` onward and a handler bound to `Primary` is
    /// never invoked here. On exhaustion the error lists `primary` followed
    /// by every fallback level attempted.
    pub async fn call_with_fallback<Req, Res, E, F, Fut>(
        &self,
        priority: Priority,
        chain: &FallbackChain<Req, Res, E>,
        request: Req,
        primary: F,
    ) -> Result<FallbackOutcome<Res>, ResilienceError<E>>
    where
        Req: Clone,
        F: FnOnce(Req) -> Fut,
        Fut: Future<Output = Result<Res, E>>,
    {
        let attempt = request.clone();
        match self.call(priority, move || primary(attempt)).await {
            Ok(value) => Ok(FallbackOutcome {
                value,
                level: FallbackLevel::Primary,
                degraded: false,
            }),
            Err(error) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    policy = %self.name,
                    fallback = %chain.name(),
                    rejected = error.is_rejection(),
                    "guarded call failed, falling back"
                );
                #[cfg(not(feature = "tracing"))]
                let _ = error;

                chain
                    .execute_from(FallbackLevel::Replica, request)
                    .await
                    .map_err(|exhausted| {
                        let FallbackError::Exhausted { name, failures } = exhausted;
                        let attempted = std::iter::once(FallbackLevel::Primary)
                            .chain(failures.iter().map(|f| f.level))
                            .map(|level| level.to_string())
                            .collect();
                        ResilienceError::FallbackExhausted { name, attempted }
                    })
            }
        }
    }
}

fn flatten<E>(err: BulkheadError<ResilienceError<E>>) -> ResilienceError<E> {
    match err {
        BulkheadError::Operation(inner) => inner,
        BulkheadError::Full(full) => ResilienceError::BulkheadFull {
            name: full.name,
            active_calls: full.active_calls,
            max_concurrent_calls: full.max_concurrent_calls,
        },
        BulkheadError::TimeoutExceeded { name, timeout, .. } => {
            ResilienceError::Timeout { name, timeout }
        }
    }
}

impl fmt::Debug for ResilientCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientCall")
            .field("name", &self.name)
            .field("rate_limiter", &self.rate_limiter.as_ref().map(RateLimiter::name))
            .field("bulkhead", &self.bulkhead.as_ref().map(Bulkhead::name))
            .field("adaptive_timeout", &self.timeout.as_ref().map(AdaptiveTimeout::name))
            .field("cost", &self.cost)
            .field("enforce_deadline", &self.enforce_deadline)
            .finish()
    }
}
