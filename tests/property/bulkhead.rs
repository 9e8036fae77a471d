//! Property tests for the bulkhead.
//!
//! Invariants tested:
//! - Concurrent calls never exceed max_concurrent_calls
//! - Every call is either completed or rejected, never both
//! - Permits are all returned once calls finish

use bulwark_bulkhead::{Bulkhead, Priority};
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::Runtime;

/// Tracks how many operations run at once
#[derive(Clone, Default)]
struct ConcurrencyTracker {
    current: Arc<AtomicUsize>,
    max_seen: Arc<AtomicUsize>,
}

impl ConcurrencyTracker {
    async fn work(&self, duration_ms: u64) -> Result<(), std::io::Error> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(duration_ms)).await;

        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: The bulkhead never allows more concurrent calls than configured
    #[test]
    fn bulkhead_respects_max_concurrent(
        max_concurrent in 1usize..=20,
        num_requests in 1usize..=100,
        work_duration_ms in 1u64..=10,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let bulkhead = Bulkhead::builder()
                .max_concurrent_calls(max_concurrent)
                .build();
            let tracker = ConcurrencyTracker::default();
            let completed = Arc::new(AtomicUsize::new(0));
            let rejected = Arc::new(AtomicUsize::new(0));

            let mut handles = Vec::with_capacity(num_requests);
            for _ in 0..num_requests {
                let bulkhead = bulkhead.clone();
                let tracker = tracker.clone();
                let completed = Arc::clone(&completed);
                let rejected = Arc::clone(&rejected);
                handles.push(tokio::spawn(async move {
                    match bulkhead
                        .execute(Priority::Normal, || tracker.work(work_duration_ms))
                        .await
                    {
                        Ok(()) => completed.fetch_add(1, Ordering::SeqCst),
                        Err(e) if e.is_full() => rejected.fetch_add(1, Ordering::SeqCst),
                        Err(e) => panic!("unexpected error: {e}"),
                    };
                }));
            }

            for handle in handles {
                handle.await.unwrap();
            }

            let observed_max = tracker.max_seen.load(Ordering::SeqCst);
            prop_assert!(
                observed_max <= max_concurrent,
                "Observed {} concurrent calls but limit was {}",
                observed_max,
                max_concurrent
            );

            let completed = completed.load(Ordering::SeqCst);
            let rejected = rejected.load(Ordering::SeqCst);
            prop_assert_eq!(completed + rejected, num_requests);
            prop_assert!(completed >= max_concurrent.min(num_requests));

            let stats = bulkhead.stats();
            prop_assert_eq!(stats.rejected_calls, rejected as u64);
            prop_assert_eq!(stats.active_calls, 0);
            prop_assert_eq!(bulkhead.available_permits(), max_concurrent);

            Ok(())
        })?;
    }

    /// Property: Holding permits directly rejects exactly the overflow
    #[test]
    fn held_permits_reject_overflow(
        max_concurrent in 1usize..=32,
        attempts in 1usize..=64,
    ) {
        let bulkhead = Bulkhead::builder()
            .max_concurrent_calls(max_concurrent)
            .build();

        let mut held = Vec::new();
        let mut rejections = 0usize;
        for _ in 0..attempts {
            match bulkhead.try_acquire(Priority::Normal) {
                Ok(permit) => held.push(permit),
                Err(full) => {
                    prop_assert_eq!(full.active_calls, max_concurrent);
                    rejections += 1;
                }
            }
        }

        prop_assert_eq!(held.len(), attempts.min(max_concurrent));
        prop_assert_eq!(rejections, attempts.saturating_sub(max_concurrent));
        prop_assert_eq!(bulkhead.active_calls(), held.len());

        drop(held);
        prop_assert_eq!(bulkhead.active_calls(), 0);
        prop_assert_eq!(bulkhead.stats().utilization_percent, 0.0);
    }
}
