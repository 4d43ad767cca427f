//! Error types for classifier training and inference.

use thiserror::Error;

/// Errors that can occur while preparing data for, training, or running
/// the pixel classifier.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// Not enough labeled samples or classes to train and evaluate.
    #[error("Insufficient training data: {reason}")]
    InsufficientData {
        /// What was missing
        reason: String,
    },

    /// A spectrum or feature buffer had the wrong length.
    #[error("Shape mismatch: expected {expected} values, found {found}")]
    ShapeMismatch {
        /// Expected number of values
        expected: usize,
        /// Number of values supplied
        found: usize,
    },

    /// A training hyper-parameter is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ClassifierError {
    /// Create an insufficient data error.
    pub fn insufficient(reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
        }
    }
}
