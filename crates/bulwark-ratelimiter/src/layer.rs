use crate::limiter::RateLimiter;
use crate::service::RateLimiterService;
use tower_layer::Layer;

/// A Tower [`Layer`] that checks a shared [`RateLimiter`] before every
/// request.
///
/// # Examples
///
/// ```
/// use bulwark_ratelimiter::RateLimiter;
/// use tower::ServiceBuilder;
///
/// # async fn example() {
/// let limiter = RateLimiter::builder()
///     .name("uploads")
///     .leaky_bucket(20, 5.0)
///     .build();
///
/// let service = ServiceBuilder::new()
///     .layer(limiter.layer())
///     .service(my_service());
/// # }
/// # fn my_service() -> impl tower::Service<String, Response = String, Error = std::io::Error> {
/// #     tower::service_fn(|req: String| async move { Ok::<_, std::io::Error>(req) })
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct RateLimiterLayer {
    limiter: RateLimiter,
    cost: u32,
}

impl RateLimiterLayer {
    /// Creates a layer charging one unit per request.
    pub fn new(limiter: RateLimiter) -> Self {
        Self { limiter, cost: 1 }
    }

    /// Sets how many units each request consumes.
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }
}

impl<S> Layer<S> for RateLimiterLayer {
    type Service = RateLimiterService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimiterService::new(service, self.limiter.clone(), self.cost)
    }
}
