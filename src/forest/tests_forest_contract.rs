// =========================================================================
// FALSIFY-NF: IsolationForest novelty-scorer contract
//
// Invariants under test:
//   NF-001  scores are in [0, 1]
//   NF-002  score count matches input count
//   NF-003  fitting is deterministic under a fixed seed
//   NF-004  an isolated point scores above the dense cluster
//
// References:
//   - Liu, Ting, Zhou (2008) "Isolation Forest"
// =========================================================================

use super::*;
use crate::traits::NoveltyScorer;

/// FALSIFY-NF-001: scores stay in [0, 1] on arbitrary data.
#[test]
fn falsify_nf_001_scores_bounded() {
    let rows: Vec<Vec<f64>> = (0..50)
        .map(|i| {
            let x = f64::from(i);
            vec![(x * 0.37).sin() * 10.0, (x * 0.11).cos() * 3.0]
        })
        .collect();

    let mut forest = IsolationForest::new()
        .with_n_trees(50)
        .with_random_state(42);
    forest.fit(&rows).expect("fit succeeds");

    let scores = forest.predict(&rows).expect("predict succeeds");
    for (i, &score) in scores.iter().enumerate() {
        assert!(
            (0.0..=1.0).contains(&score),
            "FALSIFIED NF-001: score[{i}]={score}, expected in [0,1]"
        );
    }
}

/// FALSIFY-NF-002: one score per input vector.
#[test]
fn falsify_nf_002_score_count() {
    let rows: Vec<Vec<f64>> = (0..24).map(|i| vec![f64::from(i % 4), 1.0]).collect();
    let mut forest = IsolationForest::new()
        .with_n_trees(25)
        .with_random_state(9);
    forest.fit(&rows).expect("fit succeeds");

    let scores = forest.predict(&rows[..7]).expect("predict succeeds");
    assert_eq!(
        scores.len(),
        7,
        "FALSIFIED NF-002: {} scores for 7 inputs",
        scores.len()
    );
}

mod forest_proptest_falsify {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10))]

        /// FALSIFY-NF-001-prop: bounded scores for random data and seeds.
        #[test]
        fn falsify_nf_001_prop_scores_bounded(
            n in 8..=30usize,
            seed in 0..200u64,
        ) {
            let rows: Vec<Vec<f64>> = (0..n)
                .map(|i| {
                    let x = (i as f64 + seed as f64) * 0.37;
                    vec![x.sin() * 10.0, x.cos() * 10.0]
                })
                .collect();
            let mut forest = IsolationForest::new()
                .with_n_trees(30)
                .with_random_state(seed);
            forest.fit(&rows).expect("fit");

            let scores = forest.predict(&rows).expect("predict");
            for &score in &scores {
                prop_assert!((0.0..=1.0).contains(&score));
            }
        }

        /// FALSIFY-NF-003-prop: same seed, same data, same scores.
        #[test]
        fn falsify_nf_003_prop_deterministic(seed in 0..100u64) {
            let rows: Vec<Vec<f64>> = (0..20)
                .map(|i| vec![f64::from(i % 5), f64::from(i % 3)])
                .collect();
            let mut a = IsolationForest::new().with_n_trees(20).with_random_state(seed);
            let mut b = IsolationForest::new().with_n_trees(20).with_random_state(seed);
            a.fit(&rows).expect("fit a");
            b.fit(&rows).expect("fit b");
            prop_assert_eq!(a.predict(&rows).expect("a"), b.predict(&rows).expect("b"));
        }
    }
}

/// FALSIFY-NF-004: a far-away point scores above the dense cluster, over
/// a range of seeds.
#[test]
fn falsify_nf_004_outlier_separation() {
    for seed in [1u64, 17, 99] {
        let mut rows: Vec<Vec<f64>> = (0..64)
            .map(|i| vec![f64::from(i % 8) * 0.05, f64::from(i % 4) * 0.05])
            .collect();
        rows.push(vec![40.0, 40.0]);

        let mut forest = IsolationForest::new().with_random_state(seed);
        forest.fit(&rows).expect("fit succeeds");
        let scores = forest.predict(&rows).expect("predict succeeds");

        let outlier = scores[scores.len() - 1];
        let max_inlier = scores[..scores.len() - 1]
            .iter()
            .fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        assert!(
            outlier > max_inlier,
            "FALSIFIED NF-004: outlier {outlier} <= max inlier {max_inlier} (seed {seed})"
        );
    }
}
