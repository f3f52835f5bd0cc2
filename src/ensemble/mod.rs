//! Weighted fusion of SPC and novelty-scoring signals.
//!
//! The ensemble projects each incoming feature vector onto a composite
//! scalar for the SPC path, scores the full vector with a periodically
//! retrained novelty scorer, and fuses both signals into a single anomaly
//! decision. Either collaborator can fail or be untrained; the ensemble
//! degrades the affected signal instead of propagating the failure.

use crate::error::Result;
use crate::forest::IsolationForest;
use crate::numeric::RingBuffer;
use crate::spc::SigmaWindowTest;
use crate::traits::{NoveltyScorer, StatisticalTest};
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::thread;
use tracing::warn;

/// Fixed feature-importance prior for the composite projection: session
/// duration, tab-switch frequency, focus duration, category score,
/// time-based score.
const COMPOSITE_WEIGHTS: [f64; 5] = [0.30, 0.25, 0.20, 0.15, 0.10];

/// Configuration for a [`FusionEnsemble`].
///
/// Weights are renormalized to sum to 1 at construction and on every
/// update; the threshold is clamped to `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Weight of the SPC flag in the combined score.
    pub spc_weight: f64,
    /// Weight of the novelty flag in the combined score.
    pub if_weight: f64,
    /// Combined-score threshold for declaring an anomaly.
    pub threshold: f64,
    /// Feature-buffer capacity (oldest vectors evicted past it).
    pub buffer_capacity: usize,
    /// Retrain the novelty scorer every this many points.
    pub retrain_interval: u64,
    /// Minimum buffered vectors required before a retrain runs.
    pub min_retrain_samples: usize,
    /// Novelty score above which the novelty flag raises.
    pub if_flag_threshold: f64,
    /// Train on a background thread and swap the result in atomically
    /// (`false` retrains inline, blocking the triggering `predict`).
    pub background_retrain: bool,
    /// Rolling-window size of the default SPC collaborator.
    pub spc_window_size: usize,
    /// Control-limit multiplier of the default SPC collaborator.
    pub spc_sigma: f64,
    /// Tree count of the default novelty scorer.
    pub forest_trees: usize,
    /// Per-tree subsample size of the default novelty scorer.
    pub forest_subsample: usize,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            spc_weight: 0.5,
            if_weight: 0.5,
            threshold: 0.5,
            buffer_capacity: 200,
            retrain_interval: 50,
            min_retrain_samples: 30,
            if_flag_threshold: 0.7,
            background_retrain: true,
            spc_window_size: 50,
            spc_sigma: 3.0,
            forest_trees: 100,
            forest_subsample: 256,
        }
    }
}

impl EnsembleConfig {
    /// Sets the fusion weights (renormalized at use).
    #[must_use]
    pub fn with_weights(mut self, spc_weight: f64, if_weight: f64) -> Self {
        self.spc_weight = spc_weight;
        self.if_weight = if_weight;
        self
    }

    /// Sets the anomaly threshold (clamped at use).
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the feature-buffer capacity (>= 1).
    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }

    /// Sets the retrain cadence in points (>= 1).
    #[must_use]
    pub fn with_retrain_interval(mut self, interval: u64) -> Self {
        self.retrain_interval = interval.max(1);
        self
    }

    /// Selects inline or background retraining.
    #[must_use]
    pub fn with_background_retrain(mut self, background: bool) -> Self {
        self.background_retrain = background;
        self
    }

    /// Sets the default SPC collaborator's window and sigma.
    #[must_use]
    pub fn with_spc(mut self, window_size: usize, sigma: f64) -> Self {
        self.spc_window_size = window_size.max(1);
        self.spc_sigma = sigma;
        self
    }

    /// Sets the default novelty scorer's tree count and subsample size.
    #[must_use]
    pub fn with_forest(mut self, trees: usize, subsample: usize) -> Self {
        self.forest_trees = trees.max(1);
        self.forest_subsample = subsample.max(2);
        self
    }
}

/// Collaborator snapshots attached to every prediction for observability.
#[derive(Debug, Clone)]
pub struct PredictionDetails<SS, MI> {
    /// SPC collaborator's internal statistics.
    pub spc: SS,
    /// Novelty scorer's model descriptor.
    pub novelty: MI,
}

/// Outcome of one `predict` call.
#[derive(Debug, Clone)]
pub struct Prediction<SS, MI> {
    /// Final fused decision.
    pub is_anomaly: bool,
    /// Weighted combination of the two flags, in `[0, 1]`.
    pub combined_score: f64,
    /// Whether the SPC test flagged the composite scalar.
    pub spc_flag: bool,
    /// Novelty score for the full vector (0 when untrained or degraded).
    pub if_score: f64,
    /// Fixed-weight projection fed to the SPC path.
    pub composite_feature: f64,
    /// Distance of the combined score from maximal uncertainty, in `[0, 1]`.
    pub confidence: f64,
    /// Read-only collaborator snapshots.
    pub details: PredictionDetails<SS, MI>,
}

/// Aggregate read-only snapshot of the ensemble.
#[derive(Debug, Clone)]
pub struct EnsembleStats<SS, MI> {
    /// Current SPC weight (sums to 1 with `if_weight`).
    pub spc_weight: f64,
    /// Current novelty weight.
    pub if_weight: f64,
    /// Current anomaly threshold.
    pub threshold: f64,
    /// Vectors currently buffered for retraining.
    pub buffer_len: usize,
    /// Points seen since construction or the last reset.
    pub points: u64,
    /// Completed retrains.
    pub retrains: u64,
    /// Retrains that failed (logged, never propagated).
    pub retrain_failures: u64,
    /// Predictions that degraded the novelty signal to 0.
    pub degraded_predictions: u64,
    /// SPC collaborator's internal statistics.
    pub spc: SS,
    /// Novelty scorer's model descriptor.
    pub novelty: MI,
}

/// Anomaly-scoring ensemble fusing an SPC test with a novelty scorer.
///
/// One instance watches one stream; calls are synchronous and must be
/// serialized per instance. Retraining defaults to a background thread
/// whose result a later `predict` swaps in, keeping `predict` latency
/// bounded.
///
/// # Examples
///
/// ```
/// use vigilar::prelude::*;
///
/// let mut ensemble = FusionEnsemble::new(EnsembleConfig::default());
/// let p = ensemble.predict(&[30.0, 5.0, 2.0, 1.0, 0.0]);
/// assert!((p.composite_feature - 11.4).abs() < 1e-9);
/// assert!((0.0..=1.0).contains(&p.combined_score));
/// ```
pub struct FusionEnsemble<S: StatisticalTest, N: NoveltyScorer> {
    spc_weight: f64,
    if_weight: f64,
    threshold: f64,
    if_flag_threshold: f64,
    retrain_interval: u64,
    min_retrain_samples: usize,
    background_retrain: bool,
    buffer: RingBuffer<Vec<f64>>,
    points: u64,
    retrains: u64,
    retrain_failures: u64,
    degraded_predictions: u64,
    spc: S,
    scorer: N,
    pending: Option<mpsc::Receiver<(N, Result<()>)>>,
}

impl FusionEnsemble<SigmaWindowTest, IsolationForest> {
    /// Builds an ensemble with the default collaborator pairing: a
    /// sigma-window SPC test and an isolation forest.
    #[must_use]
    pub fn new(config: EnsembleConfig) -> Self {
        let spc = SigmaWindowTest::with_window_size(config.spc_window_size)
            .with_sigma(config.spc_sigma);
        let scorer = IsolationForest::new()
            .with_n_trees(config.forest_trees)
            .with_subsample_size(config.forest_subsample);
        Self::with_collaborators(config, spc, scorer)
    }
}

impl<S, N> FusionEnsemble<S, N>
where
    S: StatisticalTest,
    N: NoveltyScorer + Clone + Send + 'static,
{
    /// Builds an ensemble around caller-supplied collaborators.
    ///
    /// The ensemble depends only on the [`StatisticalTest`] and
    /// [`NoveltyScorer`] contracts, so any implementations plug in here.
    #[must_use]
    pub fn with_collaborators(config: EnsembleConfig, spc: S, scorer: N) -> Self {
        let (spc_weight, if_weight) = normalize_weights(config.spc_weight, config.if_weight);
        Self {
            spc_weight,
            if_weight,
            threshold: config.threshold.clamp(0.0, 1.0),
            if_flag_threshold: config.if_flag_threshold,
            retrain_interval: config.retrain_interval.max(1),
            min_retrain_samples: config.min_retrain_samples,
            background_retrain: config.background_retrain,
            buffer: RingBuffer::new(config.buffer_capacity.max(1))
                .unwrap_or_else(|_| unreachable!("capacity floored at 1")),
            points: 0,
            retrains: 0,
            retrain_failures: 0,
            degraded_predictions: 0,
            spc,
            scorer,
            pending: None,
        }
    }

    /// Scores one feature vector and fuses both signals into a decision.
    ///
    /// Never fails: an untrained or failing novelty scorer degrades to a
    /// neutral 0 score, and retraining errors are logged and counted.
    pub fn predict(&mut self, features: &[f64]) -> Prediction<S::Snapshot, N::ModelInfo> {
        self.buffer.push(features.to_vec());

        let composite_feature = composite_feature(features);
        let spc_flag = self.spc.add_data_point(composite_feature);

        // Swap in a background-retrained scorer before scoring.
        self.absorb_retrained();

        let if_score = if self.scorer.is_trained() {
            match self.scorer.predict(&[features.to_vec()]) {
                Ok(scores) => scores.first().copied().unwrap_or(0.0),
                Err(err) => {
                    warn!(error = %err, "novelty scoring failed, degrading to 0");
                    self.degraded_predictions += 1;
                    0.0
                }
            }
        } else {
            0.0
        };

        self.points += 1;
        if self.points % self.retrain_interval == 0 && self.buffer.len() >= self.min_retrain_samples
        {
            self.trigger_retrain();
        }

        let if_flag = if_score > self.if_flag_threshold;
        let combined_score = self.spc_weight * f64::from(u8::from(spc_flag))
            + self.if_weight * f64::from(u8::from(if_flag));
        let is_anomaly = combined_score >= self.threshold;
        let confidence = (combined_score - 0.5).abs() * 2.0;

        Prediction {
            is_anomaly,
            combined_score,
            spc_flag,
            if_score,
            composite_feature,
            confidence,
            details: PredictionDetails {
                spc: self.spc.snapshot(),
                novelty: self.scorer.model_info(),
            },
        }
    }

    /// Renormalizes the fusion weights to sum to 1.
    ///
    /// Negative inputs are clamped to 0 first; an all-zero pair falls back
    /// to an even split.
    pub fn update_weights(&mut self, spc_weight: f64, if_weight: f64) {
        let (spc, ifw) = normalize_weights(spc_weight, if_weight);
        self.spc_weight = spc;
        self.if_weight = ifw;
    }

    /// Sets the anomaly threshold, clamped to `[0, 1]`.
    pub fn update_threshold(&mut self, threshold: f64) {
        self.threshold = threshold.clamp(0.0, 1.0);
    }

    /// Discards buffered vectors and counters and resets both
    /// collaborators; configuration is preserved.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.points = 0;
        self.retrains = 0;
        self.retrain_failures = 0;
        self.degraded_predictions = 0;
        self.spc.reset();
        self.scorer.reset();
        // Drop any in-flight retrain result; it was trained on discarded data.
        self.pending = None;
    }

    /// Aggregate read-only snapshot.
    #[must_use]
    pub fn stats(&self) -> EnsembleStats<S::Snapshot, N::ModelInfo> {
        EnsembleStats {
            spc_weight: self.spc_weight,
            if_weight: self.if_weight,
            threshold: self.threshold,
            buffer_len: self.buffer.len(),
            points: self.points,
            retrains: self.retrains,
            retrain_failures: self.retrain_failures,
            degraded_predictions: self.degraded_predictions,
            spc: self.spc.snapshot(),
            novelty: self.scorer.model_info(),
        }
    }

    /// Whether a background retrain is still in flight.
    #[must_use]
    pub fn retrain_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn trigger_retrain(&mut self) {
        // At most one retrain in flight; a due retrain is skipped while
        // the previous one is still training.
        if self.pending.is_some() {
            return;
        }

        let snapshot = self.buffer.to_vec();
        let mut fresh = self.scorer.clone();
        fresh.reset();

        if self.background_retrain {
            let (tx, rx) = mpsc::channel();
            self.pending = Some(rx);
            thread::spawn(move || {
                let outcome = fresh.fit(&snapshot);
                // The ensemble may have been dropped meanwhile; nothing to do.
                let _ = tx.send((fresh, outcome));
            });
        } else {
            match fresh.fit(&snapshot) {
                Ok(()) => {
                    self.scorer = fresh;
                    self.retrains += 1;
                }
                Err(err) => {
                    warn!(error = %err, "novelty retraining failed, keeping previous model");
                    self.retrain_failures += 1;
                }
            }
        }
    }

    fn absorb_retrained(&mut self) {
        let Some(rx) = self.pending.take() else {
            return;
        };
        match rx.try_recv() {
            Ok((scorer, Ok(()))) => {
                self.scorer = scorer;
                self.retrains += 1;
            }
            Ok((_, Err(err))) => {
                warn!(error = %err, "novelty retraining failed, keeping previous model");
                self.retrain_failures += 1;
            }
            Err(mpsc::TryRecvError::Empty) => {
                // Still training; keep waiting.
                self.pending = Some(rx);
            }
            Err(mpsc::TryRecvError::Disconnected) => {
                warn!("novelty retraining thread vanished, keeping previous model");
                self.retrain_failures += 1;
            }
        }
    }
}

/// Fixed-weight projection of the first five features onto one scalar.
#[must_use]
pub fn composite_feature(features: &[f64]) -> f64 {
    features
        .iter()
        .zip(COMPOSITE_WEIGHTS.iter())
        .map(|(f, w)| f * w)
        .sum()
}

fn normalize_weights(spc_weight: f64, if_weight: f64) -> (f64, f64) {
    let spc = if spc_weight.is_finite() { spc_weight.max(0.0) } else { 0.0 };
    let ifw = if if_weight.is_finite() { if_weight.max(0.0) } else { 0.0 };
    let sum = spc + ifw;
    if sum <= 0.0 {
        (0.5, 0.5)
    } else {
        (spc / sum, ifw / sum)
    }
}
