//! Property tests for the engine's core invariants.

use analogs::outcome::Statistics;
use analogs::pattern;
use analogs::prelude::*;
use analogs::search::rank;
use proptest::prelude::*;

fn hourly(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle {
            time: i as i64 * 3600,
            open: c,
            high: c + 1.0,
            low: (c - 1.0).max(0.0),
            close: c,
            volume: None,
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_normalized_values_lie_in_unit_range(
        closes in prop::collection::vec(0.01f64..10_000.0, 1..80)
    ) {
        let normalized = pattern::normalize(&closes);
        prop_assert_eq!(normalized.len(), closes.len());
        for &v in &normalized {
            prop_assert!((0.0..=1.0).contains(&v));
        }

        let min = closes.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = closes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if max > min {
            // Non-degenerate windows span the full unit range.
            prop_assert!(normalized.iter().any(|&v| v == 0.0));
            prop_assert!(normalized.iter().any(|&v| v == 1.0));
        } else {
            prop_assert!(normalized.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn prop_extraction_is_none_iff_window_overruns(
        closes in prop::collection::vec(1.0f64..100.0, 1..40),
        start in 0usize..50,
        length in 1usize..50,
    ) {
        let bars = hourly(&closes);
        let extracted = pattern::extract(&bars, start, length);
        prop_assert_eq!(extracted.is_none(), start + length > bars.len());
    }

    #[test]
    fn prop_dtw_identity(values in prop::collection::vec(0.0f64..=1.0, 1..40)) {
        prop_assert_eq!(ExactDtw.distance(&values, &values), 0.0);
    }

    #[test]
    fn prop_dtw_symmetry(
        a in prop::collection::vec(0.0f64..=1.0, 1..30),
        b in prop::collection::vec(0.0f64..=1.0, 1..30),
    ) {
        let ab = ExactDtw.distance(&a, &b);
        let ba = ExactDtw.distance(&b, &a);
        prop_assert!(ab >= 0.0);
        prop_assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn prop_fast_dtw_bounded_below_by_exact(
        values in prop::collection::vec((0.0f64..=1.0, 0.0f64..=1.0), 4..64)
    ) {
        // Equal-length pairs, as produced by the extractor.
        let (a, b): (Vec<f64>, Vec<f64>) = values.into_iter().unzip();
        let exact = ExactDtw.distance(&a, &b);
        let fast = FastDtw::new(1).distance(&a, &b);
        // The banded search explores a subset of alignments.
        prop_assert!(fast >= exact - 1e-9);
    }

    #[test]
    fn prop_rank_invariants(
        raw in prop::collection::vec((0usize..2000, 0.0f64..10.0), 0..60),
        min_gap in 1usize..100,
        top_n in 1usize..20,
    ) {
        let candidates: Vec<CandidateMatch> = raw
            .into_iter()
            .map(|(index, distance)| CandidateMatch {
                index,
                distance,
                start_price: 1.0,
                end_price: 1.0,
            })
            .collect();

        let ranked = rank(candidates, min_gap, top_n);
        prop_assert!(ranked.len() <= top_n);
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].distance <= pair[1].distance);
        }
        for (i, a) in ranked.iter().enumerate() {
            for b in &ranked[i + 1..] {
                prop_assert!(a.index.abs_diff(b.index) >= min_gap);
            }
        }
    }

    #[test]
    fn prop_statistics_bounds(
        sample in prop::collection::vec(-100.0f64..100.0, 0..50)
    ) {
        let stats = Statistics::from_sample(&sample);
        prop_assert!((0.0..=100.0).contains(&stats.win_rate));
        prop_assert_eq!(stats.count, sample.len());
        if sample.is_empty() {
            prop_assert_eq!(stats, Statistics::empty());
        } else {
            prop_assert!(stats.max_down <= stats.median_return);
            prop_assert!(stats.median_return <= stats.max_up);
        }
    }
}
