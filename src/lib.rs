//! hyperleaf - Hyperspectral leaf analysis
//!
//! Turns an uploaded spectral cube (and optionally a per-pixel label map)
//! into a health analysis: a per-request pixel classifier, NDVI and LCI
//! vegetation indices, a rendered three-panel figure, a rule-based health
//! verdict and an optional language-model report.
//!
//! ```rust,ignore
//! use hyperleaf::{AnalysisRequest, AppConfig, Pipeline};
//!
//! let pipeline = Pipeline::from_config(AppConfig::new());
//! let request = AnalysisRequest::from_paths(cube_path, Some(labels_path))?;
//! let result = pipeline.run(&request)?;
//! println!("{}", result.analysis_text);
//! ```

pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod indices;
pub mod llm;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod summary;

pub use config::{AppConfig, ConfigError, LogLevel};
pub use data::{LabelMap, SpectralCube};
pub use error::{AnalysisError, Result};
pub use indices::{BandSelection, VegetationIndices};
pub use llm::{LanguageModel, LlmConfig, ModelServiceError, OllamaClient};
pub use pipeline::{AnalysisRequest, AnalysisResult, Pipeline};
pub use scene::ClassMap;
pub use summary::{AiSummary, HealthCategory, HealthReport};
