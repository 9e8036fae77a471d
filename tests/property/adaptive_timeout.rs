//! Property tests for the adaptive timeout.
//!
//! Invariants tested:
//! - The bound never exceeds the static ceiling
//! - Percentiles are ordered p50 <= p95 <= p99 <= p999
//! - History never grows past history_size

use bulwark_timeout::AdaptiveTimeout;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: The bound stays within (0, ceiling]
    #[test]
    fn bound_never_exceeds_ceiling(
        ceiling_ms in 1u64..=10_000,
        multiplier in 1.0f64..=5.0,
        samples in prop::collection::vec(0.0f64..=50_000.0, 0..300),
    ) {
        let timeout = AdaptiveTimeout::builder()
            .request_timeout_ms(ceiling_ms)
            .percentile_multiplier(multiplier)
            .min_samples(10)
            .build();

        for sample in &samples {
            timeout.record_latency_ms(*sample);
            prop_assert!(timeout.timeout_ms() <= ceiling_ms);
        }

        if samples.len() < 10 {
            prop_assert_eq!(timeout.timeout_ms(), ceiling_ms);
        }
    }

    /// Property: Reported percentiles are monotonic
    #[test]
    fn percentiles_are_ordered(
        samples in prop::collection::vec(0.0f64..=5_000.0, 10..500),
    ) {
        let timeout = AdaptiveTimeout::builder()
            .request_timeout_ms(60_000)
            .min_samples(10)
            .build();
        for sample in &samples {
            timeout.record_latency_ms(*sample);
        }

        let stats = timeout.stats();
        prop_assert!(stats.p50 <= stats.p95);
        prop_assert!(stats.p95 <= stats.p99);
        prop_assert!(stats.p99 <= stats.p999);
    }

    /// Property: The retained history is capped at history_size
    #[test]
    fn history_is_bounded(
        history_size in 1usize..=200,
        num_samples in 0usize..=500,
    ) {
        let timeout = AdaptiveTimeout::builder()
            .history_size(history_size)
            .min_samples(1)
            .build();
        for i in 0..num_samples {
            timeout.record_latency_ms(i as f64);
        }

        prop_assert_eq!(timeout.sample_count(), num_samples.min(history_size));
    }

    /// Property: With adaptation disabled the bound is always the ceiling
    #[test]
    fn disabled_bound_is_static(
        ceiling_ms in 1u64..=10_000,
        samples in prop::collection::vec(0.0f64..=100.0, 0..200),
    ) {
        let timeout = AdaptiveTimeout::builder()
            .request_timeout_ms(ceiling_ms)
            .adaptive_enabled(false)
            .build();
        for sample in &samples {
            timeout.record_latency_ms(*sample);
        }

        prop_assert_eq!(timeout.timeout_ms(), ceiling_ms);
    }
}
