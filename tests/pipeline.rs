use std::path::Path;
use std::sync::{Arc, Mutex};

use hyperleaf::{
    AiSummary, AnalysisError, AnalysisRequest, AppConfig, HealthCategory, LanguageModel,
    ModelServiceError, Pipeline,
};
use ndarray::{Array2, Array3, array};
use ndarray_npy::WriteNpyExt;

fn to_npy<A: WriteNpyExt>(array: &A) -> Vec<u8> {
    let mut bytes = Vec::new();
    array.write_npy(&mut bytes).unwrap();
    bytes
}

fn config_in(dir: &Path) -> AppConfig {
    let mut config = AppConfig::new();
    config.output.dir = dir.to_path_buf();
    config.llm.enabled = false;
    config
}

/// Two labeled blocks of six pixels, last column unlabeled.
fn two_region_labels() -> Array2<i32> {
    array![[1, 1, 1, 0], [1, 1, 1, 0], [2, 2, 2, 0], [2, 2, 2, 0]]
}

/// Bright near-infrared plateau over dim visible bands.
fn vegetation_cube() -> Array3<f32> {
    Array3::from_shape_fn((4, 4, 60), |(_, _, b)| if b >= 40 { 0.9 } else { 0.1 })
}

struct StubModel {
    reply: Result<String, String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl StubModel {
    fn replying(reply: &str) -> (Self, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let model = Self {
            reply: Ok(reply.to_string()),
            prompts: Arc::clone(&prompts),
        };
        (model, prompts)
    }

    fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Arc::default(),
        }
    }
}

impl LanguageModel for StubModel {
    fn name(&self) -> &str {
        "stub"
    }

    fn complete(&self, prompt: &str) -> Result<String, ModelServiceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .map_err(ModelServiceError::Unavailable)
    }
}

#[test]
fn uniform_cube_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()), None)
        .with_language_model(Box::new(StubModel::failing("connection refused")));

    let cube = Array3::<f32>::from_elem((4, 4, 50), 0.5);
    let labels = two_region_labels();
    let request = AnalysisRequest::new(to_npy(&cube))
        .with_labels(to_npy(&labels))
        .with_request_id("e2e");

    let result = pipeline.run(&request).unwrap();

    assert_eq!(result.shape, [4, 4, 50]);
    assert_eq!(result.num_classes, Some(2));
    assert_eq!(result.labeled_pixels, 12);
    let accuracy = result.accuracy.unwrap();
    assert!((0.0..=1.0).contains(&accuracy));

    let class_map = result.class_map.as_ref().unwrap();
    assert_eq!(class_map.dim(), (4, 4));
    for row in 0..4 {
        assert_eq!(class_map.classes()[[row, 3]], 0);
        assert_eq!(class_map.get(row, 3), None);
    }

    assert!(result.ndvi_mean.abs() < 1e-6);
    assert!(result.lci_mean.abs() < 1e-6);
    assert_eq!(result.health, HealthCategory::Stressed);
    assert_eq!(result.analysis_text, HealthCategory::Stressed.message());

    assert!(result.plot_file.starts_with("analysis_"));
    assert!(result.plot_file.ends_with("_e2e.png"));
    assert_eq!(result.plot_path, dir.path().join(&result.plot_file));
    assert!(result.plot_path.is_file());

    match result.ai_summary {
        Some(AiSummary::Unstructured { raw_text, error }) => {
            assert_eq!(raw_text, None);
            assert!(error.contains("connection refused"));
        }
        other => panic!("expected degraded summary, got {other:?}"),
    }
}

#[test]
fn structured_summary_without_labels() {
    let dir = tempfile::tempdir().unwrap();
    let (model, prompts) = StubModel::replying(
        r#"Here is my analysis:
{"problem_detected": false, "severity_level": "none",
 "summary": "Dense, green canopy.", "recommendations": ["Keep irrigating"]}
Let me know if you need more."#,
    );
    let pipeline = Pipeline::new(config_in(dir.path()), Some(Box::new(model)));

    let request = AnalysisRequest::new(to_npy(&vegetation_cube())).with_request_id("veg");
    let result = pipeline.run(&request).unwrap();

    assert_eq!(result.accuracy, None);
    assert_eq!(result.num_classes, None);
    assert!(result.class_map.is_none());
    assert_eq!(result.labeled_pixels, 0);
    assert!(result.ndvi_mean > 0.9);
    assert!(result.lci_mean > 0.9);
    assert_eq!(result.health, HealthCategory::Healthy);

    let Some(AiSummary::Structured(report)) = &result.ai_summary else {
        panic!("expected structured summary, got {:?}", result.ai_summary);
    };
    assert_eq!(report.problem_detected, Some(false));
    assert_eq!(report.summary.as_deref(), Some("Dense, green canopy."));
    assert_eq!(report.recommendations, vec!["Keep irrigating".to_string()]);

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Accuracy: N/A"));
    assert!(prompts[0].contains(HealthCategory::Healthy.message()));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["shape"], serde_json::json!([4, 4, 60]));
    assert!(json["accuracy"].is_null());
    assert_eq!(json["health"], "healthy");
    assert_eq!(json["ai_summary"]["kind"], "structured");
    assert_eq!(json["ai_summary"]["report"]["summary"], "Dense, green canopy.");
    assert!(json.get("class_map").is_none());
}

#[test]
fn no_language_model_means_no_summary() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()), None);

    let result = pipeline
        .run(&AnalysisRequest::new(to_npy(&vegetation_cube())))
        .unwrap();
    assert!(result.ai_summary.is_none());
    assert!(!result.request_id.is_empty());
    assert!(result.plot_path.is_file());
}

#[test]
fn label_shape_mismatch_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()), None);

    let labels = Array2::<i32>::ones((4, 5));
    let request = AnalysisRequest::new(to_npy(&vegetation_cube())).with_labels(to_npy(&labels));

    let err = pipeline.run(&request).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput { .. }), "{err}");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn single_class_is_insufficient_data() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()), None);

    let labels = Array2::<i32>::ones((4, 4));
    let request = AnalysisRequest::new(to_npy(&vegetation_cube())).with_labels(to_npy(&labels));

    let err = pipeline.run(&request).unwrap_err();
    assert!(matches!(err, AnalysisError::InsufficientData { .. }), "{err}");
}

#[test]
fn oversized_label_value_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()), None);

    let cube = Array3::<f32>::from_shape_fn((4, 4, 8), |(r, c, b)| (r + c + b) as f32);
    let labels = array![
        [1, 1, 2_000_000_000, 2_000_000_000],
        [1, 1, 2_000_000_000, 2_000_000_000],
        [0, 0, 0, 0],
        [0, 0, 0, 0]
    ];
    let request = AnalysisRequest::new(to_npy(&cube)).with_labels(to_npy(&labels));

    let err = pipeline.run(&request).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput { .. }), "{err}");
    assert!(err.to_string().contains("2000000000"));
}

#[test]
fn unlabeled_map_is_insufficient_data() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()), None);

    let labels = Array2::<i32>::zeros((4, 4));
    let request = AnalysisRequest::new(to_npy(&vegetation_cube())).with_labels(to_npy(&labels));

    let err = pipeline.run(&request).unwrap_err();
    assert!(matches!(err, AnalysisError::InsufficientData { .. }), "{err}");
}

#[test]
fn wrong_rank_cube_is_data_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()), None);

    let flat = Array2::<f32>::zeros((4, 4));
    let err = pipeline.run(&AnalysisRequest::new(to_npy(&flat))).unwrap_err();
    assert!(matches!(err, AnalysisError::DataFormat { .. }), "{err}");
}

#[test]
fn plot_files_are_request_scoped() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()), None);
    let cube = to_npy(&vegetation_cube());

    let first = pipeline
        .run(&AnalysisRequest::new(cube.clone()).with_request_id("a"))
        .unwrap();
    let second = pipeline
        .run(&AnalysisRequest::new(cube.clone()).with_request_id("b"))
        .unwrap();
    assert_ne!(first.plot_file, second.plot_file);
    assert!(first.plot_path.is_file());
    assert!(second.plot_path.is_file());

    // same inputs share the fingerprint part of the name
    let prefix = |name: &str| name.rsplit_once('_').map(|(p, _)| p.to_string());
    assert_eq!(prefix(&first.plot_file), prefix(&second.plot_file));

    let other_cube = to_npy(&Array3::<f32>::from_elem((4, 4, 60), 0.2));
    let third = pipeline
        .run(&AnalysisRequest::new(other_cube).with_request_id("a"))
        .unwrap();
    assert_ne!(first.plot_file, third.plot_file);
}

#[test]
fn request_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let cube_path = dir.path().join("cube.npy");
    let labels_path = dir.path().join("labels.npy");
    std::fs::write(&cube_path, to_npy(&Array3::<f64>::from_elem((4, 4, 50), 0.5))).unwrap();
    std::fs::write(&labels_path, to_npy(&two_region_labels())).unwrap();

    let request = AnalysisRequest::from_paths(&cube_path, Some(&labels_path)).unwrap();
    let pipeline = Pipeline::new(config_in(&dir.path().join("out")), None);
    let result = pipeline.run(&request).unwrap();

    assert_eq!(result.shape, [4, 4, 50]);
    assert_eq!(result.labeled_pixels, 12);
    assert!(result.plot_path.starts_with(dir.path().join("out")));
}
