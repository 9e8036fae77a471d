//! Adaptive timeout example: the bound follows observed latency
//! Run with: cargo run -p bulwark-timeout --example adaptive_timeout

use bulwark_timeout::{AdaptiveTimeout, TimeoutError};
use std::time::Duration;
use tokio::time::sleep;

async fn query(latency_ms: u64) -> &'static str {
    sleep(Duration::from_millis(latency_ms)).await;
    "rows"
}

#[tokio::main]
async fn main() {
    let timeout = AdaptiveTimeout::builder()
        .name("ledger-db")
        .request_timeout(Duration::from_secs(2))
        .history_size(100)
        .min_samples(20)
        .on_timeout_adjusted(|previous, current| {
            println!("  [TIMEOUT] Bound {:?} -> {:?}", previous, current);
        })
        .on_deadline_elapsed(|bound| {
            println!("  [TIMEOUT] Gave up after {:?}", bound);
        })
        .build();

    println!("Static ceiling before warm-up: {:?}\n", timeout.timeout());

    // Advisory mode: observe never interrupts, it only records latency.
    println!("Observing 20 queries of about 20ms...");
    for i in 0..20 {
        let latency = 15 + (i % 10);
        let (_, elapsed) = timeout.observe(query(latency)).await;
        if i % 5 == 0 {
            println!("  query {} took {:?}", i, elapsed);
        }
    }

    let stats = timeout.stats();
    println!(
        "\nAfter warm-up: bound {}ms (p50 {}ms, p95 {}ms, {} samples)\n",
        stats.timeout_ms, stats.p50, stats.p95, stats.sample_count
    );

    // Enforced mode: a query slower than the bound is dropped.
    for latency in [18, 400] {
        match timeout.run_with_deadline(query(latency)).await {
            Ok(rows) => println!("{}ms query returned {}", latency, rows),
            Err(TimeoutError::Elapsed { timeout, .. }) => {
                println!("{}ms query dropped at {:?}", latency, timeout)
            }
        }
    }

    timeout.reset();
    println!("\nAfter reset: {:?}", timeout.timeout());
}
