//! Error types for the analysis pipeline.

use hyperleaf_nn::ClassifierError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::llm::ModelServiceError;

/// Errors that can abort an analysis request.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Cube or label file could not be decoded
    #[error("Data format error: {message}")]
    DataFormat {
        /// Description of the problem
        message: String,
    },

    /// Inputs decode fine but do not fit together
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the problem
        message: String,
    },

    /// Too few labeled pixels or classes to train and evaluate
    #[error("Insufficient data: {message}")]
    InsufficientData {
        /// Description of what is missing
        message: String,
    },

    /// Language model call failed
    #[error("Model service error: {0}")]
    ModelService(#[from] ModelServiceError),

    /// I/O error while reading inputs or writing the figure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AnalysisError {
    /// Create a data format error.
    pub fn data_format(message: impl Into<String>) -> Self {
        Self::DataFormat {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an insufficient data error.
    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::InsufficientData {
            message: message.into(),
        }
    }
}

impl From<ClassifierError> for AnalysisError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::InsufficientData { reason } => Self::insufficient_data(reason),
            other => Self::invalid_input(other.to_string()),
        }
    }
}

impl From<image::ImageError> for AnalysisError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => Self::Io(io),
            other => Self::Io(std::io::Error::other(other)),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
