use bulwark_ratelimiter::{Admission, RateLimitAlgorithm, RateLimitError, RateLimiter};
use std::time::Duration;
use tokio::time::advance;

#[tokio::test(start_paused = true)]
async fn token_bucket_bursts_then_refills() {
    let limiter = RateLimiter::new("checkout", RateLimitAlgorithm::token_bucket(5, 5.0));

    for _ in 0..5 {
        assert!(limiter.check(1).is_ok());
    }
    let err = limiter.check(1).unwrap_err();
    assert_eq!(err.retry_after(), Some(Duration::from_millis(200)));

    advance(Duration::from_secs(1)).await;
    for _ in 0..5 {
        assert!(limiter.allow());
    }
    assert!(!limiter.allow());

    let stats = limiter.stats();
    assert_eq!(stats.algorithm, "token_bucket");
    assert_eq!(stats.limit, 5);
    assert_eq!(stats.admitted, 10);
    assert_eq!(stats.denied, 2);
}

#[tokio::test(start_paused = true)]
async fn token_bucket_never_exceeds_capacity_after_idle() {
    let limiter = RateLimiter::new("idle", RateLimitAlgorithm::token_bucket(3, 100.0));
    advance(Duration::from_secs(3600)).await;

    assert!(limiter.allow_n(3));
    assert!(!limiter.allow());
}

#[tokio::test(start_paused = true)]
async fn sliding_window_limits_any_trailing_window() {
    let limiter = RateLimiter::new(
        "search",
        RateLimitAlgorithm::sliding_window(3, Duration::from_secs(10)),
    );

    assert!(limiter.allow());
    advance(Duration::from_secs(4)).await;
    assert!(limiter.allow_n(2));

    advance(Duration::from_secs(4)).await;
    match limiter.check(1) {
        Err(RateLimitError::Exceeded { name, retry_after }) => {
            assert_eq!(name, "search");
            // The first admission (t=0) rolls out at t=10; now is t=8.
            assert_eq!(retry_after, Some(Duration::from_secs(2)));
        }
        Ok(()) => panic!("window is full"),
    }

    advance(Duration::from_millis(2001)).await;
    assert!(limiter.allow());
    assert!(!limiter.allow());
}

#[tokio::test(start_paused = true)]
async fn leaky_bucket_drains_at_constant_rate() {
    let limiter = RateLimiter::new("writes", RateLimitAlgorithm::leaky_bucket(4, 2.0));

    assert!(limiter.allow_n(4));
    assert!(!limiter.allow());

    advance(Duration::from_millis(500)).await;
    assert!(limiter.allow());
    assert!(!limiter.allow());

    advance(Duration::from_secs(2)).await;
    assert_eq!(limiter.stats().available, 4);
}

#[tokio::test(start_paused = true)]
async fn oversized_requests_get_no_retry_hint() {
    for algorithm in [
        RateLimitAlgorithm::token_bucket(2, 1.0),
        RateLimitAlgorithm::sliding_window(2, Duration::from_secs(1)),
        RateLimitAlgorithm::leaky_bucket(2, 1.0),
    ] {
        let kind = algorithm.kind();
        let limiter = RateLimiter::new(kind, algorithm);
        let err = limiter.check(3).unwrap_err();
        assert_eq!(err.retry_after(), None, "{}", kind);
        assert_eq!(limiter.stats().available, 2, "{}", kind);
    }
}

#[tokio::test(start_paused = true)]
async fn reset_restores_capacity_and_counters() {
    let resets = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let r = std::sync::Arc::clone(&resets);

    let limiter = RateLimiter::builder()
        .name("reports")
        .leaky_bucket(2, 0.0)
        .on_reset(move || {
            r.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        })
        .build();

    assert!(limiter.allow_n(2));
    assert!(!limiter.allow());

    limiter.reset();
    assert_eq!(resets.load(std::sync::atomic::Ordering::SeqCst), 1);
    let stats = limiter.stats();
    assert_eq!((stats.available, stats.admitted, stats.denied), (2, 0, 0));
    assert!(limiter.allow());
}

#[test]
fn algorithm_deserializes_from_tagged_map() {
    let algorithm: RateLimitAlgorithm = serde_json::from_str(
        r#"{ "algorithm": "sliding_window", "limit": 60, "window_seconds": 60.0 }"#,
    )
    .unwrap();
    assert_eq!(
        algorithm,
        RateLimitAlgorithm::sliding_window(60, Duration::from_secs(60))
    );
}
