use bulwark_bulkhead::{Bulkhead, BulkheadError, Priority};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// 100 concurrent callers against 10 permits: the peak in-flight count never
/// exceeds the cap and every call is either served or rejected.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn hundred_callers_never_exceed_cap() {
    let bulkhead = Bulkhead::builder()
        .name("db-pool")
        .max_concurrent_calls(10)
        .build();

    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut handles = vec![];
    for _ in 0..100 {
        let bulkhead = bulkhead.clone();
        let current = Arc::clone(&current);
        let peak = Arc::clone(&peak);
        handles.push(tokio::spawn(async move {
            bulkhead
                .execute(Priority::Normal, || async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(5)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, ()>(())
                })
                .await
        }));
    }

    let mut served = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => served += 1,
            Err(BulkheadError::Full(_)) => rejected += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(served + rejected, 100);
    assert!(peak.load(Ordering::SeqCst) <= 10);
    assert_eq!(bulkhead.stats().rejected_calls, rejected as u64);
    assert_eq!(bulkhead.active_calls(), 0);
    assert_eq!(bulkhead.available_permits(), 10);
}

#[tokio::test]
async fn permit_released_when_operation_fails() {
    let bulkhead = Bulkhead::builder().max_concurrent_calls(1).build();

    let err = bulkhead
        .execute(Priority::Normal, || async { Err::<(), _>("boom") })
        .await
        .unwrap_err();
    assert_eq!(err.into_operation(), Some("boom"));

    assert_eq!(bulkhead.active_calls(), 0);
    assert!(bulkhead.try_acquire(Priority::Normal).is_ok());
}

#[tokio::test]
async fn permit_released_when_operation_panics() {
    let bulkhead = Bulkhead::builder().max_concurrent_calls(1).build();

    let b = bulkhead.clone();
    let result = tokio::spawn(async move {
        b.execute(Priority::Normal, || async {
            if std::hint::black_box(true) {
                panic!("operation panicked");
            }
            Ok::<(), ()>(())
        })
        .await
    })
    .await;

    assert!(result.unwrap_err().is_panic());
    assert_eq!(bulkhead.active_calls(), 0);
    assert_eq!(bulkhead.available_permits(), 1);
}

#[tokio::test(start_paused = true)]
async fn permit_released_when_caller_is_cancelled() {
    let bulkhead = Bulkhead::builder().max_concurrent_calls(1).build();

    let cancelled = tokio::time::timeout(
        Duration::from_millis(10),
        bulkhead.execute(Priority::Normal, || async {
            sleep(Duration::from_secs(60)).await;
            Ok::<_, ()>(())
        }),
    )
    .await;

    assert!(cancelled.is_err());
    assert_eq!(bulkhead.active_calls(), 0);
    assert!(bulkhead.try_acquire(Priority::Normal).is_ok());
}

#[tokio::test(start_paused = true)]
async fn soft_timeout_is_flagged_after_completion() {
    let exceeded = Arc::new(AtomicUsize::new(0));
    let e = Arc::clone(&exceeded);

    let bulkhead = Bulkhead::builder()
        .name("reports")
        .max_concurrent_calls(2)
        .timeout_ms(100)
        .on_timeout_exceeded(move |_elapsed, _timeout| {
            e.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let ran_to_completion = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&ran_to_completion);
    let err = bulkhead
        .execute(Priority::Normal, || async move {
            sleep(Duration::from_millis(250)).await;
            r.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>("late")
        })
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(ran_to_completion.load(Ordering::SeqCst), 1);

    let timed = bulkhead
        .execute_timed(Priority::Normal, || async {
            sleep(Duration::from_millis(150)).await;
            Ok::<_, ()>("kept")
        })
        .await
        .unwrap();
    assert_eq!(timed.value, "kept");
    assert!(timed.exceeded);
    assert!(timed.elapsed >= Duration::from_millis(150));

    assert_eq!(exceeded.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn operation_error_wins_over_timeout_flag() {
    let bulkhead = Bulkhead::builder().max_concurrent_calls(1).timeout_ms(1).build();

    let err = bulkhead
        .execute(Priority::Normal, || async {
            sleep(Duration::from_millis(20)).await;
            Err::<(), _>("failed slowly")
        })
        .await
        .unwrap_err();

    assert!(matches!(err, BulkheadError::Operation("failed slowly")));
}

#[tokio::test]
async fn rejection_listener_sees_capacity() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);

    let bulkhead = Bulkhead::builder()
        .max_concurrent_calls(2)
        .on_call_rejected(move |active, max| s.lock().unwrap().push((active, max)))
        .build();

    let _a = bulkhead.try_acquire(Priority::Normal).unwrap();
    let _b = bulkhead.try_acquire(Priority::Critical).unwrap();
    assert!(bulkhead.try_acquire(Priority::Critical).is_err());

    assert_eq!(*seen.lock().unwrap(), vec![(2, 2)]);
    let stats = bulkhead.stats();
    assert_eq!(stats.utilization_percent, 100.0);
}

/// Rejections racing the winners still report the bulkhead as full.
#[test]
fn racing_rejections_report_full_capacity() {
    let bulkhead = Bulkhead::builder()
        .name("render-pool")
        .max_concurrent_calls(4)
        .build();
    let barrier = Arc::new(std::sync::Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let bulkhead = bulkhead.clone();
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                let attempt = bulkhead.try_acquire(Priority::Normal);
                // Winners hold their permits until every thread has tried.
                barrier.wait();
                attempt.map(|_| ()).map_err(|full| full.active_calls)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let served = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(served, 4);
    for result in results {
        if let Err(active_calls) = result {
            assert_eq!(active_calls, 4);
        }
    }
    assert_eq!(bulkhead.available_permits(), 4);
}
