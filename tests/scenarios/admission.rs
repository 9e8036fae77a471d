use bulwark::bulkhead::Bulkhead;
use bulwark::ratelimiter::{RateLimitAlgorithm, RateLimiter};
use bulwark::timeout::AdaptiveTimeout;
use bulwark::{Priority, ResilienceError, ResilientCall};
use std::io;
use std::time::Duration;
use tokio::time::{advance, sleep};

async fn slow_query(millis: u64) -> Result<&'static str, io::Error> {
    sleep(Duration::from_millis(millis)).await;
    Ok("rows")
}

#[tokio::test(start_paused = true)]
async fn third_concurrent_call_is_rejected() {
    let call = ResilientCall::new("orders-db").with_bulkhead(
        Bulkhead::builder()
            .name("orders-db")
            .max_concurrent_calls(2)
            .build(),
    );

    let (a, b, c) = tokio::join!(
        call.call(Priority::Normal, || slow_query(100)),
        call.call(Priority::Normal, || slow_query(100)),
        call.call(Priority::Normal, || slow_query(100)),
    );

    assert_eq!(a.unwrap(), "rows");
    assert_eq!(b.unwrap(), "rows");
    match c.unwrap_err() {
        ResilienceError::BulkheadFull {
            name,
            active_calls,
            max_concurrent_calls,
        } => {
            assert_eq!(name, "orders-db");
            assert_eq!(active_calls, 2);
            assert_eq!(max_concurrent_calls, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let stats = call.bulkhead().unwrap().stats();
    assert_eq!(stats.active_calls, 0);
    assert_eq!(stats.rejected_calls, 1);
    assert_eq!(stats.utilization_percent, 0.0);
}

#[tokio::test(start_paused = true)]
async fn burst_then_refill() {
    let call = ResilientCall::new("search-api").with_rate_limiter(RateLimiter::new(
        "search-api",
        RateLimitAlgorithm::token_bucket(5, 5.0),
    ));

    for _ in 0..5 {
        call.call(Priority::Normal, || slow_query(0)).await.unwrap();
    }

    let err = call
        .call(Priority::Normal, || slow_query(0))
        .await
        .unwrap_err();
    assert!(err.is_rate_limited());
    assert!(err.is_rejection());

    advance(Duration::from_secs(1)).await;
    for _ in 0..5 {
        call.call(Priority::Normal, || slow_query(0)).await.unwrap();
    }

    let stats = call.rate_limiter().unwrap().stats();
    assert_eq!(stats.admitted, 10);
    assert_eq!(stats.denied, 1);
}

#[tokio::test(start_paused = true)]
async fn rate_limiter_runs_before_bulkhead() {
    let call = ResilientCall::new("thumbnails")
        .with_rate_limiter(RateLimiter::new(
            "thumbnails",
            RateLimitAlgorithm::token_bucket(1, 0.0),
        ))
        .with_bulkhead(Bulkhead::builder().name("thumbnails").max_concurrent_calls(1).build());

    call.call(Priority::Normal, || slow_query(5)).await.unwrap();
    let err = call
        .call(Priority::Normal, || slow_query(5))
        .await
        .unwrap_err();

    assert!(err.is_rate_limited());
    assert_eq!(call.bulkhead().unwrap().stats().rejected_calls, 0);
}

#[tokio::test(start_paused = true)]
async fn enforced_deadline_follows_observed_latency() {
    let timeout = AdaptiveTimeout::builder()
        .name("ledger")
        .request_timeout_ms(1000)
        .min_samples(10)
        .build();
    let call = ResilientCall::new("ledger")
        .with_adaptive_timeout(timeout.clone())
        .enforce_deadline(true);

    for _ in 0..10 {
        call.call(Priority::Normal, || slow_query(20)).await.unwrap();
    }
    assert_eq!(timeout.timeout(), Duration::from_millis(30));

    let err = call
        .call(Priority::Normal, || slow_query(500))
        .await
        .unwrap_err();
    match err {
        ResilienceError::Timeout { name, timeout } => {
            assert_eq!(name, "ledger");
            assert_eq!(timeout, Duration::from_millis(30));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(timeout.sample_count(), 11);
}

#[tokio::test(start_paused = true)]
async fn advisory_deadline_lets_slow_calls_finish() {
    let timeout = AdaptiveTimeout::builder()
        .request_timeout_ms(1000)
        .min_samples(10)
        .build();
    let call = ResilientCall::new("ledger").with_adaptive_timeout(timeout.clone());

    for _ in 0..10 {
        call.call(Priority::Normal, || slow_query(20)).await.unwrap();
    }

    let rows = call.call(Priority::Normal, || slow_query(500)).await.unwrap();
    assert_eq!(rows, "rows");
    assert_eq!(timeout.sample_count(), 11);
}
