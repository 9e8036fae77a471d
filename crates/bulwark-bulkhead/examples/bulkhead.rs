//! Bulkhead example: ten concurrent requests against three permits.
//! Run with: cargo run -p bulwark-bulkhead --example bulkhead

use bulwark_bulkhead::{Bulkhead, BulkheadError, Priority};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tower::{Layer, ServiceExt};

#[tokio::main]
async fn main() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let (counter, max) = (Arc::clone(&in_flight), Arc::clone(&peak));
    let report_service = tower::service_fn(move |id: u32| {
        let counter = Arc::clone(&counter);
        let max = Arc::clone(&max);
        async move {
            let current = counter.fetch_add(1, Ordering::SeqCst) + 1;
            max.fetch_max(current, Ordering::SeqCst);
            println!("Rendering report {} (in flight: {})", id, current);
            sleep(Duration::from_millis(100)).await;
            counter.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>(format!("report-{}", id))
        }
    });

    // Fail fast: a request that finds no free permit is rejected at once.
    let bulkhead = Bulkhead::builder()
        .name("report-renderer")
        .max_concurrent_calls(3)
        .timeout(Duration::from_millis(500))
        .on_call_permitted(|concurrent, priority| {
            println!("  [BULKHEAD] Permitted {} call (in flight: {})", priority, concurrent);
        })
        .on_call_rejected(|active, max| {
            println!("  [BULKHEAD] Rejected ({}/{} busy)", active, max);
        })
        .build();

    let service = bulkhead.layer().layer(report_service);

    println!("Starting 10 concurrent requests with 3 permits...\n");

    let mut handles = vec![];
    for id in 0..10 {
        let svc = service.clone();
        handles.push(tokio::spawn(async move {
            match svc.oneshot(id).await {
                Ok(report) => println!("Request {} completed: {}", id, report),
                Err(BulkheadError::Full(full)) => println!("Request {} rejected: {}", id, full),
                Err(e) => println!("Request {} failed: {:?}", id, e),
            }
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }

    // Direct use without Tower, holding a permit across the call site.
    let permit = bulkhead.try_acquire(Priority::Critical);
    println!("\nDirect acquire succeeded: {}", permit.is_ok());
    drop(permit);

    let stats = bulkhead.stats();
    println!("Peak in flight: {}", peak.load(Ordering::SeqCst));
    println!(
        "Rejected: {}, utilization now: {}%",
        stats.rejected_calls, stats.utilization_percent
    );
}
