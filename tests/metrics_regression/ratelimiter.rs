//! Rate limiter metrics regression tests

use super::helpers::*;
use serial_test::serial;

use bulwark_ratelimiter::{RateLimitAlgorithm, RateLimiter};
use std::time::Duration;
use tower::{Layer, Service, ServiceExt};

#[tokio::test]
#[serial]
async fn ratelimiter_metrics_exist() {
    init_recorder();

    let limiter = RateLimiter::new(
        "test_ratelimiter",
        RateLimitAlgorithm::sliding_window(10, Duration::from_secs(1)),
    );
    let service = tower::service_fn(|_: u64| async { Ok::<_, &'static str>("success") });
    let mut service = limiter.layer().layer(service);

    for i in 0..3 {
        let _ = service.ready().await.unwrap().call(i).await;
    }

    assert_counter_exists("ratelimiter_calls_admitted_total");
    assert_metric_has_label("ratelimiter_calls_admitted_total", "ratelimiter", "test_ratelimiter");
    assert_gauge_exists("ratelimiter_available_capacity");
    assert_metric_has_label("ratelimiter_available_capacity", "ratelimiter", "test_ratelimiter");
}

#[tokio::test]
#[serial]
async fn ratelimiter_rejection_metrics() {
    init_recorder();

    let limiter = RateLimiter::new("reject_ratelimiter", RateLimitAlgorithm::token_bucket(2, 0.0));

    for _ in 0..20 {
        let _ = limiter.check(1);
    }

    assert_counter_exists("ratelimiter_calls_denied_total");
    assert_eq!(
        counter_value("ratelimiter_calls_denied_total", "ratelimiter", "reject_ratelimiter"),
        Some(18)
    );
}
