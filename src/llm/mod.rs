//! Language model collaborator used for the AI health report.
//!
//! The pipeline only needs free-text completion, so the seam is a single
//! trait. [`OllamaClient`] talks to a local Ollama server; tests plug in
//! their own implementations.

mod ollama;

pub use ollama::OllamaClient;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};

/// Free-text completion service.
pub trait LanguageModel: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Complete a single user prompt.
    fn complete(&self, prompt: &str) -> Result<String, ModelServiceError>;
}

/// Errors from a language model call.
#[derive(Error, Debug)]
pub enum ModelServiceError {
    /// Transport failure, including timeouts
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("model service returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// Reply did not have the expected shape
    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    /// Client could not be built or reached
    #[error("model service unavailable: {0}")]
    Unavailable(String),
}

/// Language model settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ask the model for a report at all
    pub enabled: bool,
    /// Server root, without the API path
    pub base_url: String,
    /// Model tag
    pub model: String,
    /// Request timeout in seconds; `None` waits indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl LlmConfig {
    /// Request timeout as a duration.
    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_secs.map(std::time::Duration::from_secs)
    }
}
