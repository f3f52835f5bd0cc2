//! Collaborator contracts for the fusion ensemble.
//!
//! The ensemble depends only on these traits, so any per-point significance
//! test and any batch-trained outlier scorer can be plugged in behind them.

use crate::error::Result;
use std::fmt;

/// Per-point statistical-process-control test over a scalar stream.
///
/// An implementation watches one scalar stream and answers, point by point,
/// whether the latest observation deviates significantly from expected
/// process behavior.
///
/// # Examples
///
/// ```
/// use vigilar::prelude::*;
///
/// let mut spc = SigmaWindowTest::new();
/// for i in 0..20 {
///     spc.add_data_point(f64::from(i % 3));
/// }
/// // A wild outlier against a tight window is flagged.
/// assert!(spc.add_data_point(1000.0));
/// ```
pub trait StatisticalTest {
    /// Read-only snapshot type exposed for observability.
    type Snapshot: Clone + fmt::Debug;

    /// Feeds one observation; returns `true` when it is a statistically
    /// significant deviation.
    fn add_data_point(&mut self, value: f64) -> bool;

    /// Read-only snapshot of the test's internal statistics.
    fn snapshot(&self) -> Self::Snapshot;

    /// Clears accumulated state; configuration is preserved.
    fn reset(&mut self);
}

/// Batch-trained outlier scorer over full feature vectors.
///
/// Implementations are retrained periodically from buffered history by the
/// ensemble; between retrains, `predict` scores vectors against the last
/// fitted model.
pub trait NoveltyScorer {
    /// Read-only model descriptor exposed for observability.
    type ModelInfo: Clone + fmt::Debug;

    /// Fits the scorer on a batch of feature vectors.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed input (empty batch, ragged or
    /// non-finite rows). Callers own the recovery policy.
    fn fit(&mut self, vectors: &[Vec<f64>]) -> Result<()>;

    /// Scores each vector; higher means more novel. Scores are in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the scorer is untrained or dimensions mismatch.
    fn predict(&self, vectors: &[Vec<f64>]) -> Result<Vec<f64>>;

    /// Whether `fit` has completed since construction or the last `reset`.
    fn is_trained(&self) -> bool;

    /// Read-only snapshot of the fitted model's shape.
    fn model_info(&self) -> Self::ModelInfo;

    /// Discards the trained model; configuration is preserved.
    fn reset(&mut self);
}
