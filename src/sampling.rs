// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Correction for size-weighted Poisson sampling.
//!
//! A stream sampled with average sampling distance R captures an event of
//! size S with probability `1 - exp(-S/R)`, so larger events are
//! over-represented in the observed totals. Scaling an observed total by the
//! inverse capture probability of its average event size projects it back to
//! an estimate of the true population total.

/// Computes the multiplier that projects observed `(count, metric_value)`
/// totals back to the population estimate.
///
/// Returns the identity multiplier when `rate <= 0` (exhaustive, unsampled
/// collection) or when either total is zero, so callers never divide by zero
/// and never scale an empty observation.
pub fn sampling_ratio(rate: i64, count: i64, metric_value: i64) -> f64 {
    if rate <= 0 || count == 0 || metric_value == 0 {
        return 1_f64;
    }

    let avg = metric_value as f64 / count as f64;
    1_f64 / (1_f64 - (-avg / rate as f64).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unsampled_collection_is_identity() {
        assert_eq!(1_f64, sampling_ratio(0, 5, 100));
        assert_eq!(1_f64, sampling_ratio(-512, 5, 100));
    }

    #[test]
    fn empty_observation_is_identity() {
        assert_eq!(1_f64, sampling_ratio(1000, 0, 100));
        assert_eq!(1_f64, sampling_ratio(1000, 5, 0));
    }

    #[test]
    fn average_size_equal_to_rate() {
        // One event whose size equals the sampling distance: the capture
        // probability is 1 - e^-1.
        let expected = 1_f64 / (1_f64 - (-1_f64).exp());
        let actual = sampling_ratio(1000, 1, 1000);
        assert!((actual - expected).abs() < 1e-12);
    }

    #[test]
    fn small_events_are_scaled_up_more() {
        let small = sampling_ratio(8192, 1, 16);
        let large = sampling_ratio(8192, 1, 1 << 20);
        assert!(small > large);
        // A 16-byte event under an 8 KiB sampling distance is captured about
        // once every 512 occurrences.
        assert!(small > 500_f64 && small < 520_f64);
        // An event much larger than the sampling distance is almost always
        // captured.
        assert!(large >= 1_f64 && large < 1.0001_f64);
    }

    proptest! {
        #[test]
        fn ratio_is_at_least_one(
            rate in 1i64..=1_000_000_000,
            count in 1i64..=1_000_000,
            metric in 1i64..=1_000_000_000_000,
        ) {
            let ratio = sampling_ratio(rate, count, metric);
            prop_assert!(ratio >= 1_f64);
            prop_assert!(ratio.is_finite());
        }
    }
}
