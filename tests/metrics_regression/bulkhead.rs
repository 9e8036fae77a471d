//! Bulkhead metrics regression tests

use super::helpers::*;
use serial_test::serial;

use bulwark_bulkhead::{Bulkhead, Priority};
use std::time::Duration;

#[tokio::test]
#[serial]
async fn bulkhead_call_metrics_exist() {
    init_recorder();

    let bulkhead = Bulkhead::builder()
        .name("metrics_bulkhead")
        .max_concurrent_calls(4)
        .build();

    for ok in [true, false, true] {
        let _ = bulkhead
            .execute(Priority::Normal, || async move {
                if ok { Ok(()) } else { Err("boom") }
            })
            .await;
    }

    assert_counter_exists("bulkhead_calls_permitted_total");
    assert_counter_exists("bulkhead_calls_finished_total");
    assert_counter_exists("bulkhead_calls_failed_total");
    assert_gauge_exists("bulkhead_concurrent_calls");
    assert_histogram_exists("bulkhead_call_duration_seconds");
    assert_metric_has_label("bulkhead_calls_permitted_total", "bulkhead", "metrics_bulkhead");
    assert_metric_has_label("bulkhead_call_duration_seconds", "bulkhead", "metrics_bulkhead");
}

#[tokio::test]
#[serial]
async fn bulkhead_rejection_metrics() {
    init_recorder();

    let bulkhead = Bulkhead::builder()
        .name("reject_bulkhead")
        .max_concurrent_calls(1)
        .build();

    let _held = bulkhead.try_acquire(Priority::Normal).unwrap();
    for _ in 0..3 {
        let _ = bulkhead
            .execute(Priority::Normal, || async { Ok::<_, ()>(()) })
            .await;
    }

    assert_counter_exists("bulkhead_calls_rejected_total");
    assert_eq!(
        counter_value("bulkhead_calls_rejected_total", "bulkhead", "reject_bulkhead"),
        Some(3)
    );
}

#[tokio::test(start_paused = true)]
#[serial]
async fn bulkhead_timeout_metrics() {
    init_recorder();

    let bulkhead = Bulkhead::builder()
        .name("slow_bulkhead")
        .timeout(Duration::from_millis(10))
        .build();

    let _ = bulkhead
        .execute(Priority::Normal, || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, ()>(())
        })
        .await;

    assert_counter_exists("bulkhead_timeouts_exceeded_total");
    assert_metric_has_label("bulkhead_timeouts_exceeded_total", "bulkhead", "slow_bulkhead");
}
