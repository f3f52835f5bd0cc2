//! Error types for Vigilar operations.
//!
//! Provides rich error context for library consumers.

use std::fmt;

/// Main error type for Vigilar operations.
///
/// Provides detailed context about failures including dimension mismatches,
/// untrained models, and invalid hyperparameters.
///
/// # Examples
///
/// ```
/// use vigilar::error::VigilarError;
///
/// let err = VigilarError::DimensionMismatch {
///     expected: "9 (3x3)".to_string(),
///     actual: "8".to_string(),
/// };
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Debug)]
pub enum VigilarError {
    /// Matrix/vector dimensions don't match for the operation.
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Model was asked to predict before being fitted.
    NotTrained {
        /// Model name
        model: String,
    },

    /// Input contained NaN or infinite values.
    NonFiniteInput {
        /// Where the value was encountered
        context: String,
    },

    /// Invalid hyperparameter value provided.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for VigilarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VigilarError::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: expected {expected}, got {actual}")
            }
            VigilarError::NotTrained { model } => {
                write!(f, "{model} is not trained, call fit first")
            }
            VigilarError::NonFiniteInput { context } => {
                write!(f, "non-finite value in {context}")
            }
            VigilarError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
            VigilarError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for VigilarError {}

impl From<&str> for VigilarError {
    fn from(msg: &str) -> Self {
        VigilarError::Other(msg.to_string())
    }
}

impl From<String> for VigilarError {
    fn from(msg: String) -> Self {
        VigilarError::Other(msg)
    }
}

impl VigilarError {
    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create an empty input error
    #[must_use]
    pub fn empty_input(context: &str) -> Self {
        Self::Other(format!("empty input: {context}"))
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, VigilarError>;
