//! Pixel sampling and full-scene classification.

use hyperleaf_nn::{SampleSet, TrainedClassifier};
use ndarray::Array2;

use crate::data::{LabelMap, SpectralCube};
use crate::error::{AnalysisError, Result};

/// Collect every labeled pixel of `cube` as a training sample, in
/// row-major order.
pub fn collect_samples(cube: &SpectralCube, labels: &LabelMap) -> Result<SampleSet> {
    labels.ensure_matches(cube)?;

    let mut samples = SampleSet::new(cube.bands());
    let mut spectrum = Vec::with_capacity(cube.bands());
    for row in 0..cube.height() {
        for col in 0..cube.width() {
            let Some(class) = labels.class_at(row, col) else {
                continue;
            };
            spectrum.clear();
            spectrum.extend(cube.spectrum(row, col).iter().copied());
            samples.push(&spectrum, class)?;
        }
    }

    log::debug!(
        "Collected {} labeled pixels out of {}",
        samples.len(),
        cube.height() * cube.width()
    );
    Ok(samples)
}

/// Predicted class per pixel.
///
/// Pixels outside the labeled region hold the sentinel 0. The validity
/// mask is kept so a predicted class 0 can be told apart from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMap {
    classes: Array2<u32>,
    valid: Array2<bool>,
    num_classes: usize,
}

impl ClassMap {
    /// Sentinel stored for pixels without a prediction.
    pub const SENTINEL: u32 = 0;

    /// Build a class map from raw parts; both arrays must share a shape.
    pub fn new(classes: Array2<u32>, valid: Array2<bool>, num_classes: usize) -> Result<Self> {
        if classes.dim() != valid.dim() {
            return Err(AnalysisError::invalid_input(format!(
                "class map {:?} and validity mask {:?} differ in shape",
                classes.dim(),
                valid.dim()
            )));
        }
        Ok(Self {
            classes,
            valid,
            num_classes,
        })
    }

    /// `(height, width)`
    pub fn dim(&self) -> (usize, usize) {
        self.classes.dim()
    }

    /// Per-pixel classes with the sentinel outside the valid region.
    pub fn classes(&self) -> &Array2<u32> {
        &self.classes
    }

    /// Pixels that received a prediction.
    pub fn valid_mask(&self) -> &Array2<bool> {
        &self.valid
    }

    /// Prediction for a pixel, `None` outside the valid region.
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        self.valid[[row, col]].then(|| self.classes[[row, col]])
    }

    /// Number of classes the model could predict.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Valid pixels predicted as class 0, the vegetation class.
    pub fn vegetation_mask(&self) -> Array2<bool> {
        ndarray::Zip::from(&self.classes)
            .and(&self.valid)
            .map_collect(|&class, &valid| valid && class == 0)
    }

    /// Number of valid pixels predicted as each class.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_classes];
        for (&class, &valid) in self.classes.iter().zip(self.valid.iter()) {
            if valid && (class as usize) < counts.len() {
                counts[class as usize] += 1;
            }
        }
        counts
    }
}

/// Run the classifier on every labeled pixel of the scene.
pub fn predict_scene(
    classifier: &TrainedClassifier,
    cube: &SpectralCube,
    labels: &LabelMap,
) -> Result<ClassMap> {
    labels.ensure_matches(cube)?;

    let valid = labels.valid_mask();
    let mut positions = Vec::new();
    let mut spectra = Vec::new();
    for ((row, col), &is_valid) in valid.indexed_iter() {
        if is_valid {
            positions.push((row, col));
            spectra.extend(cube.spectrum(row, col).iter().copied());
        }
    }

    let predictions = classifier.predict(&spectra)?;

    let mut classes = Array2::from_elem(valid.dim(), ClassMap::SENTINEL);
    for (&(row, col), &class) in positions.iter().zip(&predictions) {
        classes[[row, col]] = class as u32;
    }

    log::info!(
        "Classified {} pixels of a {}x{} scene",
        positions.len(),
        cube.height(),
        cube.width()
    );
    ClassMap::new(classes, valid, classifier.num_classes())
}
