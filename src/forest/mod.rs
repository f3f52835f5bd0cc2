//! Isolation forest outlier scoring.
//!
//! Batch-trained novelty scorer: anomalies are isolated by fewer random
//! splits than normal points (Liu, Ting, Zhou 2008).

use crate::error::{Result, VigilarError};
use crate::traits::NoveltyScorer;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Read-only descriptor of a fitted [`IsolationForest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Whether the forest has been fitted.
    pub trained: bool,
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Configured subsample size per tree.
    pub subsample_size: usize,
    /// Feature dimensionality learned at fit time.
    pub n_features: Option<usize>,
    /// Training-set size of the last fit.
    pub trained_on: usize,
}

#[derive(Debug, Clone)]
enum IsoNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<IsoNode>,
        right: Box<IsoNode>,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone)]
struct IsoTree {
    root: IsoNode,
}

/// Average unsuccessful-search path length in a BST of `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            // Harmonic number approximation H(n-1) ~ ln(n-1) + Euler-Mascheroni
            let harmonic = (n - 1.0).ln() + 0.577_215_664_901_532_9;
            2.0 * harmonic - 2.0 * (n - 1.0) / n
        }
    }
}

/// Isolation forest producing outlier scores in `[0, 1]`.
///
/// Trees are grown over uniform subsamples; each split picks a random
/// feature and a random threshold between that feature's observed min and
/// max. A point's score is `2^(-E[h(x)] / c(psi))` where `h` is the path
/// length and `c` the average path length for the subsample size; scores
/// near 1 mean the point isolates unusually fast.
///
/// # Examples
///
/// ```
/// use vigilar::prelude::*;
///
/// let mut rows: Vec<Vec<f64>> = (0..40)
///     .map(|i| vec![f64::from(i % 5) * 0.1, f64::from(i % 7) * 0.1])
///     .collect();
/// rows.push(vec![50.0, -50.0]);
///
/// let mut forest = IsolationForest::new().with_random_state(42);
/// forest.fit(&rows).unwrap();
/// let scores = forest.predict(&rows).unwrap();
/// assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
/// ```
#[derive(Debug, Clone)]
pub struct IsolationForest {
    n_trees: usize,
    subsample_size: usize,
    random_state: Option<u64>,
    trees: Vec<IsoTree>,
    n_features: Option<usize>,
    trained_on: usize,
    /// Subsample size actually used by the last fit (clamped to the data).
    fitted_subsample: usize,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new()
    }
}

impl IsolationForest {
    /// Creates a forest of 100 trees with subsample size 256.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_trees: 100,
            subsample_size: 256,
            random_state: None,
            trees: Vec::new(),
            n_features: None,
            trained_on: 0,
            fitted_subsample: 0,
        }
    }

    /// Sets the number of trees (>= 1).
    #[must_use]
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees.max(1);
        self
    }

    /// Sets the per-tree subsample size (>= 2; clamped to the data at fit).
    #[must_use]
    pub fn with_subsample_size(mut self, subsample_size: usize) -> Self {
        self.subsample_size = subsample_size.max(2);
        self
    }

    /// Sets the random seed for deterministic fitting.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn rng(&self) -> SmallRng {
        match self.random_state {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        }
    }

    fn build_tree(
        rows: &[Vec<f64>],
        indices: &[usize],
        depth: usize,
        max_depth: usize,
        rng: &mut SmallRng,
    ) -> IsoNode {
        if indices.len() <= 1 || depth >= max_depth {
            return IsoNode::Leaf {
                size: indices.len(),
            };
        }

        let n_features = rows[indices[0]].len();
        // Features that still vary within this node.
        let splittable: Vec<(usize, f64, f64)> = (0..n_features)
            .filter_map(|f| {
                let mut lo = f64::INFINITY;
                let mut hi = f64::NEG_INFINITY;
                for &i in indices {
                    lo = lo.min(rows[i][f]);
                    hi = hi.max(rows[i][f]);
                }
                (hi > lo).then_some((f, lo, hi))
            })
            .collect();

        if splittable.is_empty() {
            return IsoNode::Leaf {
                size: indices.len(),
            };
        }

        let (feature, lo, hi) = splittable[rng.gen_range(0..splittable.len())];
        let threshold = rng.gen_range(lo..hi);

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| rows[i][feature] < threshold);

        IsoNode::Split {
            feature,
            threshold,
            left: Box::new(Self::build_tree(rows, &left, depth + 1, max_depth, rng)),
            right: Box::new(Self::build_tree(rows, &right, depth + 1, max_depth, rng)),
        }
    }

    fn path_length(&self, row: &[f64], tree: &IsoTree) -> f64 {
        let mut node = &tree.root;
        let mut depth = 0.0;
        loop {
            match node {
                IsoNode::Leaf { size } => return depth + average_path_length(*size),
                IsoNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] < *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                    depth += 1.0;
                }
            }
        }
    }

    /// Outlier score for a single vector.
    ///
    /// # Errors
    ///
    /// Same conditions as [`NoveltyScorer::predict`].
    pub fn score_sample(&self, row: &[f64]) -> Result<f64> {
        let n_features = self.n_features.ok_or_else(|| VigilarError::NotTrained {
            model: "IsolationForest".to_string(),
        })?;
        if row.len() != n_features {
            return Err(VigilarError::dimension_mismatch(
                "features",
                n_features,
                row.len(),
            ));
        }
        let mean_path = self
            .trees
            .iter()
            .map(|tree| self.path_length(row, tree))
            .sum::<f64>()
            / self.trees.len() as f64;
        let c = average_path_length(self.fitted_subsample).max(1e-12);
        let score = 2.0f64.powf(-mean_path / c);
        Ok(score.clamp(0.0, 1.0))
    }
}

impl NoveltyScorer for IsolationForest {
    type ModelInfo = ModelInfo;

    fn fit(&mut self, vectors: &[Vec<f64>]) -> Result<()> {
        if vectors.is_empty() {
            return Err(VigilarError::empty_input("isolation forest training set"));
        }
        let n_features = vectors[0].len();
        if n_features == 0 {
            return Err(VigilarError::empty_input("feature vector"));
        }
        for (i, row) in vectors.iter().enumerate() {
            if row.len() != n_features {
                return Err(VigilarError::dimension_mismatch(
                    "features",
                    n_features,
                    row.len(),
                ));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(VigilarError::NonFiniteInput {
                    context: format!("training vector {i}"),
                });
            }
        }

        let psi = self.subsample_size.min(vectors.len());
        let max_depth = (psi.max(2) as f64).log2().ceil() as usize;
        let mut rng = self.rng();

        let trees = (0..self.n_trees)
            .map(|_| {
                let indices = rand::seq::index::sample(&mut rng, vectors.len(), psi).into_vec();
                IsoTree {
                    root: Self::build_tree(vectors, &indices, 0, max_depth, &mut rng),
                }
            })
            .collect();

        self.trees = trees;
        self.n_features = Some(n_features);
        self.trained_on = vectors.len();
        self.fitted_subsample = psi;
        Ok(())
    }

    fn predict(&self, vectors: &[Vec<f64>]) -> Result<Vec<f64>> {
        vectors.iter().map(|row| self.score_sample(row)).collect()
    }

    fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            trained: self.is_trained(),
            n_trees: self.n_trees,
            subsample_size: self.subsample_size,
            n_features: self.n_features,
            trained_on: self.trained_on,
        }
    }

    fn reset(&mut self) {
        self.trees.clear();
        self.n_features = None;
        self.trained_on = 0;
        self.fitted_subsample = 0;
    }
}

#[cfg(test)]
#[path = "tests_forest_contract.rs"]
mod tests_forest_contract;
