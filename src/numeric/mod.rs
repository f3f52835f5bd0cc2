//! Numeric toolkit: pure helpers shared by the detectors.
//!
//! Independent of the detectors that use them: Shannon entropy, the
//! Hoeffding confidence bound, a small Cholesky factor/solve pair for
//! symmetric positive-definite systems, and a fixed-capacity ring buffer.

mod cholesky;
mod ring;

pub use cholesky::{cholesky_factor, cholesky_solve};
pub use ring::RingBuffer;

/// Shannon entropy in bits over a histogram of class counts.
///
/// Returns `0.0` for an empty input or when the total count is zero.
/// Zero-count classes contribute no term.
///
/// # Examples
///
/// ```
/// use vigilar::numeric::entropy;
///
/// assert_eq!(entropy(&[]), 0.0);
/// assert_eq!(entropy(&[10.0, 0.0, 0.0]), 0.0);
/// assert!((entropy(&[5.0, 5.0]) - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn entropy(class_counts: &[f64]) -> f64 {
    let total: f64 = class_counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mut h = 0.0;
    for &count in class_counts {
        if count > 0.0 {
            let p = count / total;
            h -= p * p.log2();
        }
    }
    h
}

/// Hoeffding confidence bound for a sample mean.
///
/// Returns `f64::INFINITY` when `n <= 0`, `delta <= 0`, or `delta >= 1`:
/// an invalid bound never triggers the check that uses it. Otherwise
/// `sqrt(range^2 * ln(1/delta) / (2n))`.
///
/// # Examples
///
/// ```
/// use vigilar::numeric::hoeffding_bound;
///
/// assert!(hoeffding_bound(0.0, 0.5, 10.0).is_infinite());
/// assert!(hoeffding_bound(0.05, 100.0, 1.0) < hoeffding_bound(0.05, 10.0, 1.0));
/// ```
#[must_use]
pub fn hoeffding_bound(delta: f64, n: f64, range: f64) -> f64 {
    if n <= 0.0 || delta <= 0.0 || delta >= 1.0 {
        return f64::INFINITY;
    }
    (range * range * (1.0 / delta).ln() / (2.0 * n)).sqrt()
}
