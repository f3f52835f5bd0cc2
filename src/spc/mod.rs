//! Statistical-process-control test over a scalar stream.

use crate::numeric::RingBuffer;
use crate::traits::StatisticalTest;
use serde::{Deserialize, Serialize};

/// Read-only snapshot of a [`SigmaWindowTest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpcSnapshot {
    /// Observations ever fed in since construction or the last reset.
    pub observed: u64,
    /// Observations currently in the rolling window.
    pub window_len: usize,
    /// Mean of the rolling window.
    pub mean: f64,
    /// Standard deviation of the rolling window.
    pub std_dev: f64,
    /// Points flagged as significant deviations.
    pub violations: u64,
    /// Configured control-limit multiplier.
    pub sigma: f64,
}

/// Per-point significance test with a sigma-multiplier control limit.
///
/// Keeps a rolling window of recent observations; a new point is flagged
/// when it falls more than `sigma` standard deviations from the window
/// mean. The incoming point is judged against the window as it stood
/// before the point is absorbed.
///
/// # Examples
///
/// ```
/// use vigilar::prelude::*;
///
/// let mut spc = SigmaWindowTest::new().with_sigma(3.0);
/// for i in 0..30 {
///     assert!(!spc.add_data_point(10.0 + f64::from(i % 2)));
/// }
/// assert!(spc.add_data_point(50.0));
/// ```
#[derive(Debug, Clone)]
pub struct SigmaWindowTest {
    window: RingBuffer<f64>,
    sigma: f64,
    min_samples: usize,
    observed: u64,
    violations: u64,
}

impl Default for SigmaWindowTest {
    fn default() -> Self {
        Self::new()
    }
}

impl SigmaWindowTest {
    /// Default window of 50 points with a 3-sigma control limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_window_size(50)
    }

    /// Creates a test over a rolling window of `window_size` points (>= 1).
    #[must_use]
    pub fn with_window_size(window_size: usize) -> Self {
        Self {
            window: RingBuffer::new(window_size.max(1))
                .unwrap_or_else(|_| unreachable!("window_size floored at 1")),
            sigma: 3.0,
            min_samples: 10,
            observed: 0,
            violations: 0,
        }
    }

    /// Sets the control-limit multiplier.
    #[must_use]
    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Sets how many observations the window must hold before flagging.
    #[must_use]
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples.max(1);
        self
    }

    fn window_moments(&self) -> (f64, f64) {
        let n = self.window.len();
        if n == 0 {
            return (0.0, 0.0);
        }
        let mean = self.window.iter().sum::<f64>() / n as f64;
        let var = self
            .window
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / n as f64;
        (mean, var.max(0.0).sqrt())
    }
}

impl StatisticalTest for SigmaWindowTest {
    type Snapshot = SpcSnapshot;

    fn add_data_point(&mut self, value: f64) -> bool {
        let (mean, std_dev) = self.window_moments();
        let significant = self.window.len() >= self.min_samples
            && std_dev > 1e-12
            && (value - mean).abs() > self.sigma * std_dev;

        self.window.push(value);
        self.observed += 1;
        if significant {
            self.violations += 1;
        }
        significant
    }

    fn snapshot(&self) -> SpcSnapshot {
        let (mean, std_dev) = self.window_moments();
        SpcSnapshot {
            observed: self.observed,
            window_len: self.window.len(),
            mean,
            std_dev,
            violations: self.violations,
            sigma: self.sigma,
        }
    }

    fn reset(&mut self) {
        self.window.clear();
        self.observed = 0;
        self.violations = 0;
    }
}
