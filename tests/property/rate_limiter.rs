//! Property tests for the rate limiters.
//!
//! Invariants tested:
//! - Admitted cost never exceeds capacity while nothing refills
//! - Every request is counted as admitted or denied
//! - Reset restores full capacity

use bulwark_ratelimiter::{
    Admission, LeakyBucket, RateLimitAlgorithm, RateLimiter, SlidingWindow, TokenBucket,
};
use proptest::prelude::*;
use std::time::Duration;

fn frozen_algorithm(kind: u8, capacity: u32) -> RateLimitAlgorithm {
    match kind % 3 {
        0 => RateLimitAlgorithm::token_bucket(capacity, 0.0),
        1 => RateLimitAlgorithm::sliding_window(capacity, Duration::from_secs(3600)),
        _ => RateLimitAlgorithm::leaky_bucket(capacity, 0.0),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: Without refill, admitted cost never exceeds capacity
    #[test]
    fn admitted_cost_bounded_by_capacity(
        kind in 0u8..3,
        capacity in 1u32..=50,
        costs in prop::collection::vec(1u32..=5, 1..200),
    ) {
        let limiter = RateLimiter::new("prop", frozen_algorithm(kind, capacity));

        let mut admitted_cost = 0u32;
        for cost in &costs {
            if limiter.check(*cost).is_ok() {
                admitted_cost += cost;
            }
        }

        prop_assert!(
            admitted_cost <= capacity,
            "Admitted {} units but capacity was {}",
            admitted_cost,
            capacity
        );

        let stats = limiter.stats();
        prop_assert_eq!(stats.admitted + stats.denied, costs.len() as u64);
        prop_assert_eq!(stats.available, capacity - admitted_cost);
    }

    /// Property: Unit requests are admitted exactly up to capacity
    #[test]
    fn unit_requests_fill_exactly_to_capacity(
        capacity in 1u32..=100,
        num_requests in 1usize..=300,
    ) {
        let buckets: [Box<dyn Admission>; 3] = [
            Box::new(TokenBucket::new(capacity, 0.0)),
            Box::new(SlidingWindow::new(capacity, Duration::from_secs(3600))),
            Box::new(LeakyBucket::new(capacity, 0.0)),
        ];

        for bucket in &buckets {
            let admitted = (0..num_requests).filter(|_| bucket.allow()).count();
            prop_assert_eq!(admitted, num_requests.min(capacity as usize));
        }
    }

    /// Property: Requests larger than capacity are always denied without a retry hint
    #[test]
    fn oversized_requests_never_admitted(
        kind in 0u8..3,
        capacity in 1u32..=20,
        excess in 1u32..=20,
    ) {
        let limiter = RateLimiter::new("prop", frozen_algorithm(kind, capacity));
        let err = limiter.check(capacity + excess).unwrap_err();
        prop_assert_eq!(err.retry_after(), None);
        prop_assert_eq!(limiter.stats().available, capacity);
    }

    /// Property: Reset restores full capacity
    #[test]
    fn reset_restores_capacity(
        kind in 0u8..3,
        capacity in 1u32..=50,
        drained in 0u32..=50,
    ) {
        let limiter = RateLimiter::new("prop", frozen_algorithm(kind, capacity));
        for _ in 0..drained {
            let _ = limiter.check(1);
        }

        limiter.reset();
        let stats = limiter.stats();
        prop_assert_eq!(stats.available, capacity);
        prop_assert_eq!(stats.admitted, 0);
        prop_assert_eq!(stats.denied, 0);
    }
}
