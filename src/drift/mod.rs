//! Adaptive-window concept-drift detection over a scalar stream.
//!
//! The detector keeps a compressible sequence of aggregated buckets,
//! maintains running total/variance, and scans for a statistically
//! significant split between the older and newer parts of the window.
//! On drift it truncates the stale prefix and emits a structured event
//! to a caller-registered observer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bucket count ceiling; exceeding it triggers pairwise compression.
const MAX_BUCKETS: usize = 100;

/// Aggregated statistics over one or more consecutive observations.
///
/// Buckets form an ordered sequence, oldest to newest. The only ordered
/// operations are append-one, merge-adjacent-pairs, and truncation of a
/// contiguous oldest prefix on drift.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    sum: f64,
    sum_sq: f64,
    count: u64,
    created_at: u64,
}

impl Bucket {
    /// Sum of the observations merged into this bucket.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Number of observations merged into this bucket.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Logical observation index at which the bucket was created.
    ///
    /// Merging keeps the earliest index of the pair.
    #[must_use]
    pub fn created_at(&self) -> u64 {
        self.created_at
    }
}

/// Structured drift notification delivered to the registered observer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftEvent {
    /// Total observations ever seen when the drift was detected.
    pub observed: u64,
    /// Running number of drifts, including this one.
    pub drift_count: u64,
    /// Window width at detection, before truncation.
    pub width_before: u64,
    /// Window width after the stale prefix was dropped.
    pub width_after: u64,
    /// Mean of the discarded left partition.
    pub mean_left: f64,
    /// Mean of the retained right partition.
    pub mean_right: f64,
    /// Confidence-bound magnitude the mean gap exceeded.
    pub epsilon: f64,
}

/// Read-only snapshot of the detector's window statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Observations currently in the window.
    pub width: u64,
    /// Sum of all observations in the window.
    pub total: f64,
    /// Window mean (0 when empty).
    pub mean: f64,
    /// Window variance, never negative.
    pub variance: f64,
    /// Drifts detected since construction or the last reset.
    pub drift_count: u64,
    /// Window width at the last detection, `None` before any drift.
    pub last_drift_point: Option<u64>,
    /// Whether the most recent `update` detected drift.
    pub drift_flag: bool,
    /// Buckets currently held.
    pub bucket_count: usize,
}

/// Candidate cut accepted by the drift scan.
struct Cut {
    bucket_idx: usize,
    mean_left: f64,
    mean_right: f64,
    epsilon: f64,
}

/// Adaptive-window drift detector for a single scalar stream.
///
/// Each `update` appends the value as a unit bucket, recomputes the window
/// variance, scans the bucket boundaries for a significant mean split, and
/// compresses the bucket list once it exceeds 100 entries. The scan keeps
/// running left-prefix aggregates, so one `update` is O(buckets).
///
/// One instance watches one stream; callers owning several streams keep
/// one detector per stream.
///
/// # Examples
///
/// ```
/// use vigilar::drift::AdaptiveWindow;
///
/// let mut detector = AdaptiveWindow::new();
/// for _ in 0..100 {
///     detector.update(0.0);
/// }
/// for _ in 0..100 {
///     detector.update(1.0);
/// }
/// let stats = detector.stats();
/// assert!(stats.drift_count >= 1);
/// assert!(stats.variance >= 0.0);
/// ```
pub struct AdaptiveWindow {
    buckets: Vec<Bucket>,
    total: f64,
    width: u64,
    variance: f64,
    delta: f64,
    min_window_length: u64,
    drift_flag: bool,
    drift_count: u64,
    last_drift_point: Option<u64>,
    /// Lifetime observation counter; also the `created_at` clock.
    observed: u64,
    observer: Option<Box<dyn FnMut(&DriftEvent)>>,
}

impl fmt::Debug for AdaptiveWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveWindow")
            .field("width", &self.width)
            .field("total", &self.total)
            .field("variance", &self.variance)
            .field("delta", &self.delta)
            .field("min_window_length", &self.min_window_length)
            .field("drift_count", &self.drift_count)
            .field("bucket_count", &self.buckets.len())
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl Default for AdaptiveWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptiveWindow {
    /// Creates a detector with default confidence (`delta = 0.002`) and
    /// minimum partition length 5.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: Vec::new(),
            total: 0.0,
            width: 0,
            variance: 0.0,
            delta: 0.002,
            min_window_length: 5,
            drift_flag: false,
            drift_count: 0,
            last_drift_point: None,
            observed: 0,
            observer: None,
        }
    }

    /// Sets the confidence parameter.
    ///
    /// Values outside `(0, 1)` make the significance bound infinite, so the
    /// scan never triggers; they are accepted, not rejected.
    #[must_use]
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Sets the minimum observations each partition must hold (>= 1).
    #[must_use]
    pub fn with_min_window_length(mut self, min_window_length: u64) -> Self {
        self.min_window_length = min_window_length.max(1);
        self
    }

    /// Registers the drift-event observer, replacing any previous one.
    pub fn set_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&DriftEvent) + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    /// Removes the registered observer, if any.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Feeds one observation into the window.
    ///
    /// May raise the drift flag, increment the drift count, record the
    /// drift point, truncate the oldest portion of history, and notify the
    /// observer.
    pub fn update(&mut self, value: f64) {
        self.drift_flag = false;
        self.observed += 1;
        self.buckets.push(Bucket {
            sum: value,
            sum_sq: value * value,
            count: 1,
            created_at: self.observed,
        });
        self.total += value;
        self.width += 1;
        self.recompute_variance();

        if let Some(cut) = self.find_cut() {
            self.apply_cut(&cut);
        }

        if self.buckets.len() > MAX_BUCKETS {
            self.compress();
        }
    }

    /// Read-only snapshot of the window statistics.
    #[must_use]
    pub fn stats(&self) -> WindowStats {
        WindowStats {
            width: self.width,
            total: self.total,
            mean: self.mean(),
            variance: self.variance,
            drift_count: self.drift_count,
            last_drift_point: self.last_drift_point,
            drift_flag: self.drift_flag,
            bucket_count: self.buckets.len(),
        }
    }

    /// Current window mean (0 when empty).
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.width == 0 {
            0.0
        } else {
            self.total / self.width as f64
        }
    }

    /// Current window variance.
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Observations currently in the window.
    #[must_use]
    pub fn width(&self) -> u64 {
        self.width
    }

    /// Clears all window state and statistics.
    ///
    /// Configuration (`delta`, minimum partition length) and the registered
    /// observer are preserved.
    pub fn reset(&mut self) {
        self.buckets.clear();
        self.total = 0.0;
        self.width = 0;
        self.variance = 0.0;
        self.drift_flag = false;
        self.drift_count = 0;
        self.last_drift_point = None;
        self.observed = 0;
    }

    /// Whole-window variance: `max(0, E[x^2] - E[x]^2)`, zero below two
    /// observations.
    fn recompute_variance(&mut self) {
        if self.width < 2 {
            self.variance = 0.0;
            return;
        }
        let w = self.width as f64;
        let mean = self.total / w;
        let ex2 = self.buckets.iter().map(|b| b.sum_sq).sum::<f64>() / w;
        self.variance = (ex2 - mean * mean).max(0.0);
    }

    /// Significance bound for a left/right partition of sizes `n1`/`n2`.
    ///
    /// An empty partition or an out-of-range `delta` yields infinity, so
    /// the comparison can never trigger spuriously.
    fn epsilon(&self, n1: u64, n2: u64) -> f64 {
        if n1 == 0 || n2 == 0 || self.delta <= 0.0 || self.delta >= 1.0 {
            return f64::INFINITY;
        }
        let harmonic_n = 1.0 / (1.0 / n1 as f64 + 1.0 / n2 as f64);
        let log_factor = (2.0 * (self.width as f64).ln() / self.delta).ln();
        (2.0 * self.variance * log_factor / harmonic_n).sqrt()
    }

    /// Single forward pass over bucket boundaries with running left-prefix
    /// aggregates. Returns the first candidate whose mean gap exceeds the
    /// bound; later candidates are never evaluated.
    fn find_cut(&self) -> Option<Cut> {
        if self.width < 2 * self.min_window_length {
            return None;
        }
        let mut left_count = 0u64;
        let mut left_sum = 0.0f64;

        for (idx, bucket) in self.buckets.iter().enumerate() {
            left_count += bucket.count;
            left_sum += bucket.sum;

            if left_count < self.min_window_length {
                continue;
            }
            if left_count >= self.width - self.min_window_length {
                break;
            }

            let right_count = self.width - left_count;
            let right_sum = self.total - left_sum;
            let mean_left = left_sum / left_count as f64;
            let mean_right = right_sum / right_count as f64;
            let epsilon = self.epsilon(left_count, right_count);

            if (mean_left - mean_right).abs() > epsilon {
                return Some(Cut {
                    bucket_idx: idx,
                    mean_left,
                    mean_right,
                    epsilon,
                });
            }
        }
        None
    }

    /// Declares drift at the accepted cut: records statistics, drops the
    /// left partition, and notifies the observer.
    fn apply_cut(&mut self, cut: &Cut) {
        let width_before = self.width;
        self.drift_flag = true;
        self.drift_count += 1;
        self.last_drift_point = Some(width_before);

        self.buckets.drain(..=cut.bucket_idx);
        self.total = self.buckets.iter().map(|b| b.sum).sum();
        self.width = self.buckets.iter().map(|b| b.count).sum();
        self.recompute_variance();

        let event = DriftEvent {
            observed: self.observed,
            drift_count: self.drift_count,
            width_before,
            width_after: self.width,
            mean_left: cut.mean_left,
            mean_right: cut.mean_right,
            epsilon: cut.epsilon,
        };
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
    }

    /// Merges adjacent buckets pairwise, oldest first. An unpaired final
    /// bucket passes through unchanged. Aggregates are preserved exactly;
    /// compression only coarsens granularity.
    fn compress(&mut self) {
        let old = std::mem::take(&mut self.buckets);
        let mut merged = Vec::with_capacity(old.len() / 2 + 1);
        let mut iter = old.into_iter();
        while let Some(first) = iter.next() {
            match iter.next() {
                Some(second) => merged.push(Bucket {
                    sum: first.sum + second.sum,
                    sum_sq: first.sum_sq + second.sum_sq,
                    count: first.count + second.count,
                    created_at: first.created_at.min(second.created_at),
                }),
                None => merged.push(first),
            }
        }
        self.buckets = merged;
    }

    /// Oldest-to-newest view of the current buckets.
    #[must_use]
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }
}

#[cfg(test)]
#[path = "tests_window_contract.rs"]
mod tests_window_contract;
