// =========================================================================
// FALSIFY-AW: AdaptiveWindow contract
//
// Invariants under test:
//   AW-001  variance is never negative
//   AW-002  total/width equal the bucket aggregates after every update
//   AW-003  drift_count is non-decreasing
//   AW-004  compression keeps bucket_count <= 100 and aggregates unchanged
//   AW-005  the prefix-sum scan and a naive from-scratch scan agree
// =========================================================================

use super::*;

/// Naive drift scan: recomputes the left-partition aggregates from scratch
/// for every candidate cut. Deliberately quadratic; exists only to pin the
/// optimized scan's behavior.
fn naive_find_cut(det: &AdaptiveWindow) -> Option<usize> {
    if det.width < 2 * det.min_window_length {
        return None;
    }
    for idx in 0..det.buckets.len() {
        let left_count: u64 = det.buckets[..=idx].iter().map(|b| b.count).sum();
        let left_sum: f64 = det.buckets[..=idx].iter().map(|b| b.sum).sum();

        if left_count < det.min_window_length {
            continue;
        }
        if left_count >= det.width - det.min_window_length {
            break;
        }

        let right_count = det.width - left_count;
        let right_sum = det.total - left_sum;
        let mean_left = left_sum / left_count as f64;
        let mean_right = right_sum / right_count as f64;

        if (mean_left - mean_right).abs() > det.epsilon(left_count, right_count) {
            return Some(idx);
        }
    }
    None
}

/// Builds a window directly from values grouped into buckets of `group`
/// observations, bypassing `update` so the scan can be probed on states
/// that still contain a significant cut.
fn window_from_values(values: &[f64], group: usize) -> AdaptiveWindow {
    let mut det = AdaptiveWindow::new();
    let mut created = 0u64;
    for chunk in values.chunks(group.max(1)) {
        created += 1;
        det.buckets.push(Bucket {
            sum: chunk.iter().sum(),
            sum_sq: chunk.iter().map(|v| v * v).sum(),
            count: chunk.len() as u64,
            created_at: created,
        });
    }
    det.total = values.iter().sum();
    det.width = values.len() as u64;
    det.observed = values.len() as u64;
    det.recompute_variance();
    det
}

/// FALSIFY-AW-001: variance is never negative, whatever the stream.
#[test]
fn falsify_aw_001_variance_non_negative() {
    let mut det = AdaptiveWindow::new();
    for i in 0..500 {
        let v = ((f64::from(i) * 0.37).sin() * 10.0) + if i > 250 { 40.0 } else { 0.0 };
        det.update(v);
        assert!(
            det.stats().variance >= 0.0,
            "FALSIFIED AW-001: negative variance at step {i}"
        );
    }
}

/// FALSIFY-AW-002: total and width match the bucket aggregates after every
/// public operation, including detections and compressions.
#[test]
fn falsify_aw_002_aggregate_invariant() {
    let mut det = AdaptiveWindow::new();
    for i in 0..400 {
        let level = if i >= 200 { 25.0 } else { 0.0 };
        det.update(level + f64::from(i % 5));
        let sum: f64 = det.buckets().iter().map(Bucket::sum).sum();
        let count: u64 = det.buckets().iter().map(Bucket::count).sum();
        assert!(
            (det.stats().total - sum).abs() < 1e-6,
            "FALSIFIED AW-002: total drifted from bucket sums at step {i}"
        );
        assert_eq!(
            det.stats().width,
            count,
            "FALSIFIED AW-002: width drifted from bucket counts at step {i}"
        );
    }
}

/// FALSIFY-AW-003: drift_count never decreases; last_drift_point equals the
/// pre-truncation width reported by the event.
#[test]
fn falsify_aw_003_monotone_drift_count() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let widths = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&widths);

    let mut det = AdaptiveWindow::new();
    det.set_observer(move |event: &DriftEvent| {
        sink.borrow_mut().push(event.width_before);
    });

    let mut prev = 0;
    for i in 0..600 {
        // Three regimes, two shifts.
        let level = match i {
            0..=199 => 0.0,
            200..=399 => 10.0,
            _ => -10.0,
        };
        det.update(level + f64::from(i % 3) * 0.1);
        let count = det.stats().drift_count;
        assert!(count >= prev, "FALSIFIED AW-003: drift_count decreased");
        prev = count;

        if det.stats().drift_flag {
            let reported = *widths.borrow().last().expect("observer ran");
            assert_eq!(
                det.stats().last_drift_point,
                Some(reported),
                "FALSIFIED AW-003: last_drift_point != width at detection"
            );
        }
    }
    assert!(det.stats().drift_count >= 2);
}

/// FALSIFY-AW-004: compression bounds bucket count and leaves the window
/// aggregates numerically unchanged.
#[test]
fn falsify_aw_004_compression_preserves_aggregates() {
    let mut det = AdaptiveWindow::new().with_delta(1.5); // scan disabled
    for i in 0..1000 {
        det.update(f64::from(i % 17) * 0.25);
        let stats = det.stats();
        assert!(
            stats.bucket_count <= 101,
            "FALSIFIED AW-004: bucket ceiling breached"
        );
    }
    let stats = det.stats();
    assert!(stats.bucket_count <= 100);
    assert_eq!(stats.width, 1000);
    let expected: f64 = (0..1000).map(|i| f64::from(i % 17) * 0.25).sum();
    assert!((stats.total - expected).abs() < 1e-6);
}

/// FALSIFY-AW-005: on hand-built windows containing a genuine cut, the
/// prefix scan and the naive scan pick the same bucket boundary.
#[test]
fn falsify_aw_005_scans_agree_on_shifted_window() {
    let mut values = vec![0.5; 60];
    values.extend(std::iter::repeat(9.5).take(40));
    for group in [1, 2, 3, 7] {
        let det = window_from_values(&values, group);
        let fast = det.find_cut().map(|c| c.bucket_idx);
        let slow = naive_find_cut(&det);
        assert_eq!(
            fast, slow,
            "FALSIFIED AW-005: scans disagree at group size {group}"
        );
        assert!(fast.is_some(), "expected a significant cut to exist");
    }
}

mod window_proptest_falsify {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// FALSIFY-AW-005-prop: the two scans agree on arbitrary windows,
        /// with and without shifts, across bucket granularities.
        #[test]
        fn falsify_aw_005_prop_scans_agree(
            base in proptest::collection::vec(-5.0..5.0f64, 10..80),
            shift in -20.0..20.0f64,
            split_at in 0..80usize,
            group in 1..6usize,
        ) {
            let values: Vec<f64> = base
                .iter()
                .enumerate()
                .map(|(i, v)| if i >= split_at { v + shift } else { *v })
                .collect();
            let det = window_from_values(&values, group);
            let fast = det.find_cut().map(|c| c.bucket_idx);
            let slow = naive_find_cut(&det);
            prop_assert_eq!(fast, slow);
        }

        /// FALSIFY-AW-005-prop-stream: agreement also holds on every state
        /// reached by streaming updates through the public API.
        #[test]
        fn falsify_aw_005_prop_streaming(
            values in proptest::collection::vec(-10.0..10.0f64, 20..120),
        ) {
            let mut det = AdaptiveWindow::new();
            for &v in &values {
                det.update(v);
                let fast = det.find_cut().map(|c| c.bucket_idx);
                let slow = naive_find_cut(&det);
                prop_assert_eq!(fast, slow);
            }
        }
    }
}
