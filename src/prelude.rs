//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use vigilar::prelude::*;
//! ```

pub use crate::drift::{AdaptiveWindow, DriftEvent, WindowStats};
pub use crate::ensemble::{EnsembleConfig, EnsembleStats, FusionEnsemble, Prediction};
pub use crate::error::{Result, VigilarError};
pub use crate::forest::{IsolationForest, ModelInfo};
pub use crate::numeric::{cholesky_factor, cholesky_solve, entropy, hoeffding_bound, RingBuffer};
pub use crate::spc::{SigmaWindowTest, SpcSnapshot};
pub use crate::traits::{NoveltyScorer, StatisticalTest};
