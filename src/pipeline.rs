//! Per-request analysis pipeline.
//!
//! A run is strictly linear: load, train and evaluate (when labels are
//! given), classify the scene, compute indices, render, summarize. Nothing
//! is cached between runs; the classifier is dropped when `run` returns.

use std::path::{Path, PathBuf};

use hyperleaf_nn::train;
use serde::Serialize;

use crate::config::AppConfig;
use crate::data::{LabelMap, SpectralCube, npy};
use crate::error::Result;
use crate::indices::VegetationIndices;
use crate::llm::{LanguageModel, OllamaClient};
use crate::render;
use crate::scene::{ClassMap, collect_samples, predict_scene};
use crate::summary::{AiSummary, HealthCategory, IndexSummary, build_prompt, request_summary};

/// Raw inputs of one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// `.npy` bytes of the (height, width, bands) cube
    pub cube: Vec<u8>,
    /// `.npy` bytes of the optional (height, width) label map
    pub labels: Option<Vec<u8>>,
    /// Caller-chosen id; a random UUID is used when absent
    pub request_id: Option<String>,
}

impl AnalysisRequest {
    /// Request for `cube` without labels.
    pub fn new(cube: Vec<u8>) -> Self {
        Self {
            cube,
            labels: None,
            request_id: None,
        }
    }

    /// Attach an encoded label map.
    pub fn with_labels(mut self, labels: Vec<u8>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Set the id used in the figure file name.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Read the cube and optional labels from `.npy` files.
    pub fn from_paths(cube: &Path, labels: Option<&Path>) -> Result<Self> {
        let mut request = Self::new(npy::read_array_file(cube)?);
        if let Some(labels) = labels {
            request.labels = Some(npy::read_array_file(labels)?);
        }
        Ok(request)
    }
}

/// Everything a caller gets back from a run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Id of the request this result answers
    pub request_id: String,
    /// `[height, width, bands]`
    pub shape: [usize; 3],
    /// Held-out accuracy; absent without labels
    pub accuracy: Option<f64>,
    /// Output classes of the trained classifier
    pub num_classes: Option<usize>,
    /// Pixels with a non-zero label
    pub labeled_pixels: usize,
    /// Scene-wide NDVI mean
    pub ndvi_mean: f64,
    /// Scene-wide LCI mean
    pub lci_mean: f64,
    /// Rule-based verdict
    pub health: HealthCategory,
    /// Human-readable verdict
    pub analysis_text: String,
    /// Figure file name inside the output directory
    pub plot_file: String,
    /// Language-model report, when a model is configured
    pub ai_summary: Option<AiSummary>,
    /// Full path of the written figure
    #[serde(skip)]
    pub plot_path: PathBuf,
    /// Predicted class per pixel, when labels were given
    #[serde(skip)]
    pub class_map: Option<ClassMap>,
}

/// Runs analyses with a fixed configuration and language model.
pub struct Pipeline {
    config: AppConfig,
    model: Option<Box<dyn LanguageModel>>,
}

impl Pipeline {
    /// Pipeline with an explicit language model, or none.
    pub fn new(config: AppConfig, model: Option<Box<dyn LanguageModel>>) -> Self {
        Self { config, model }
    }

    /// Pipeline with the Ollama client described by `config.llm`, if enabled.
    pub fn from_config(config: AppConfig) -> Self {
        let model: Option<Box<dyn LanguageModel>> = if config.llm.enabled {
            match OllamaClient::new(&config.llm) {
                Ok(client) => Some(Box::new(client)),
                Err(e) => {
                    log::warn!("Language model disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };
        Self::new(config, model)
    }

    /// Replace the language model.
    pub fn with_language_model(mut self, model: Box<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Effective configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Analyze one request.
    pub fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        let request_id = request
            .request_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        log::info!("[{}] Starting analysis", request_id);

        let cube = SpectralCube::from_npy_bytes(&request.cube)?;
        let labels = request
            .labels
            .as_deref()
            .map(LabelMap::from_npy_bytes)
            .transpose()?;
        if let Some(labels) = &labels {
            labels.ensure_matches(&cube)?;
        }
        log::info!("[{}] Loaded cube {:?}", request_id, cube.shape());

        let mut accuracy = None;
        let mut num_classes = None;
        let mut class_map = None;
        if let Some(labels) = &labels {
            let samples = collect_samples(&cube, labels)?;
            let classifier = train(&samples, &self.config.training)?;
            log::info!(
                "[{}] Held-out accuracy {:.3}",
                request_id,
                classifier.accuracy()
            );
            accuracy = Some(classifier.accuracy());
            num_classes = Some(classifier.num_classes());
            class_map = Some(predict_scene(&classifier, &cube, labels)?);
        }

        let indices = VegetationIndices::compute(&cube, &self.config.bands);
        let summary = IndexSummary::new(indices.ndvi_mean(), indices.lci_mean());
        log::info!(
            "[{}] NDVI mean {:.3}, LCI mean {:.3}: {:?}",
            request_id,
            summary.ndvi_mean,
            summary.lci_mean,
            summary.category
        );

        let figure = render::render_analysis(&indices, class_map.as_ref());
        let fingerprint = render::fingerprint(&request.cube, request.labels.as_deref());
        let plot_file = render::plot_file_name(&fingerprint, &request_id);
        let plot_path = render::write_png(&figure, &self.config.output.dir, &plot_file)?;

        let ai_summary = self.model.as_deref().map(|model| {
            let prompt = build_prompt(summary.ndvi_mean, summary.lci_mean, summary.message(), accuracy);
            request_summary(model, &prompt)
        });

        Ok(AnalysisResult {
            request_id,
            shape: cube.shape(),
            accuracy,
            num_classes,
            labeled_pixels: labels.as_ref().map_or(0, LabelMap::labeled_count),
            ndvi_mean: summary.ndvi_mean,
            lci_mean: summary.lci_mean,
            health: summary.category,
            analysis_text: summary.message().to_string(),
            plot_file,
            ai_summary,
            plot_path,
            class_map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let request = AnalysisRequest::new(vec![1, 2, 3])
            .with_labels(vec![4])
            .with_request_id("abc");
        assert_eq!(request.cube, vec![1, 2, 3]);
        assert_eq!(request.labels, Some(vec![4]));
        assert_eq!(request.request_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_from_paths_requires_npy_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.bin");
        std::fs::write(&path, b"not npy").unwrap();
        assert!(AnalysisRequest::from_paths(&path, None).is_err());
    }

    #[test]
    fn test_from_config_respects_disabled_llm() {
        let mut config = AppConfig::new();
        config.llm.enabled = false;
        let pipeline = Pipeline::from_config(config);
        assert!(pipeline.model.is_none());
    }

    #[test]
    fn test_invalid_cube_bytes_fail_early() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::new();
        config.output.dir = dir.path().to_path_buf();
        let pipeline = Pipeline::new(config, None);

        let err = pipeline.run(&AnalysisRequest::new(b"garbage".to_vec())).unwrap_err();
        assert!(matches!(err, crate::error::AnalysisError::DataFormat { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
