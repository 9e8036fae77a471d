//! Rate limiter example comparing the three algorithms
//! Run with: cargo run -p bulwark-ratelimiter --example ratelimiter

use bulwark_ratelimiter::{Admission, RateLimitAlgorithm, RateLimiter, RateLimiterConfig};
use std::time::Duration;
use tokio::time::sleep;
use tower::{Layer, ServiceExt};

#[tokio::main]
async fn main() {
    println!("=== Rate Limiter Example ===\n");

    // Example 1: token bucket, a burst of 5 then 10 per second
    println!("--- Token Bucket: burst then refill ---");
    let limiter = RateLimiterConfig::builder()
        .name("search-api")
        .token_bucket(5, 10.0)
        .on_denied(|cost, retry_after| {
            println!("  [LIMITER] Denied cost {} (retry in {:?})", cost, retry_after);
        })
        .build();

    for i in 0..7 {
        println!("  Request {}: admitted = {}", i, limiter.allow());
    }
    sleep(Duration::from_millis(250)).await;
    println!("  After 250ms: admitted = {}", limiter.allow());
    println!("  Stats: {:?}\n", limiter.stats());

    // Example 2: sliding window, 3 per second with no boundary bursts
    println!("--- Sliding Window: 3 per second ---");
    let limiter = RateLimiter::new(
        "login",
        RateLimitAlgorithm::sliding_window(3, Duration::from_secs(1)),
    );
    for i in 0..4 {
        match limiter.check(1) {
            Ok(()) => println!("  Attempt {} admitted", i),
            Err(e) => println!("  Attempt {} denied: {}", i, e),
        }
    }
    println!();

    // Example 3: leaky bucket as a Tower layer, weighted requests
    println!("--- Leaky Bucket: Tower layer ---");
    let limiter = RateLimiter::new("export", RateLimitAlgorithm::leaky_bucket(4, 2.0));
    let export = tower::service_fn(|rows: u32| async move {
        Ok::<_, std::io::Error>(format!("exported {} rows", rows))
    });
    let service = limiter.layer().with_cost(2).layer(export);

    for rows in [100, 200, 300, 400, 500, 600] {
        match service.clone().oneshot(rows).await {
            Ok(msg) => println!("  {}", msg),
            Err(e) => println!("  Export of {} rows rejected: {}", rows, e),
        }
    }
    println!("  Free slots left: {}", limiter.stats().available);
}
