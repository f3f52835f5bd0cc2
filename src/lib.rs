//! Vigilar: online drift detection and anomaly-scoring fusion in pure Rust.
//!
//! Vigilar watches a continuous stream of feature vectors describing
//! behavioral sessions and decides, point by point, whether the stream has
//! drifted or whether the current point is anomalous. It provides an
//! adaptive-window concept-drift detector over a scalar stream and an
//! ensemble that fuses a statistical-process-control test with a
//! periodically retrained novelty scorer.
//!
//! # Quick Start
//!
//! ```
//! use vigilar::prelude::*;
//!
//! // Drift detection over a scalar stream.
//! let mut detector = AdaptiveWindow::new();
//! for _ in 0..100 {
//!     detector.update(0.2);
//! }
//! for _ in 0..100 {
//!     detector.update(0.8);
//! }
//! assert!(detector.stats().drift_count >= 1);
//!
//! // Anomaly fusion over full feature vectors.
//! let mut ensemble = FusionEnsemble::new(EnsembleConfig::default());
//! let prediction = ensemble.predict(&[30.0, 5.0, 2.0, 1.0, 0.0]);
//! assert!((prediction.composite_feature - 11.4).abs() < 1e-9);
//! ```
//!
//! # Modules
//!
//! - [`numeric`]: entropy, Hoeffding bound, Cholesky factor/solve, ring buffer
//! - [`drift`]: adaptive-window drift detector with observer events
//! - [`spc`]: sigma-window statistical-process-control test
//! - [`forest`]: isolation-forest novelty scorer
//! - [`ensemble`]: weighted SPC/novelty fusion with buffered retraining
//!
//! One detector or ensemble instance watches one stream. Calls against an
//! instance are synchronous and must be serialized by the owner; callers
//! with several streams keep one instance per stream.

pub mod drift;
pub mod ensemble;
pub mod error;
pub mod forest;
pub mod numeric;
pub mod prelude;
pub mod spc;
pub mod traits;

pub use error::{Result, VigilarError};
pub use traits::{NoveltyScorer, StatisticalTest};
