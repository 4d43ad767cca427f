//! Labeled pixel samples and the stratified train/test split.

use std::collections::BTreeMap;

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::ClassifierError;

/// Flattened set of labeled spectra.
///
/// Spectra are stored back to back in one buffer (`len * bands` values),
/// labels are zero-based class indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    features: Vec<f32>,
    labels: Vec<usize>,
    bands: usize,
}

impl SampleSet {
    /// Create an empty sample set for spectra of `bands` values.
    pub fn new(bands: usize) -> Self {
        Self {
            features: Vec::new(),
            labels: Vec::new(),
            bands,
        }
    }

    /// Build a sample set from a flat feature buffer and matching labels.
    pub fn from_parts(
        features: Vec<f32>,
        labels: Vec<usize>,
        bands: usize,
    ) -> Result<Self, ClassifierError> {
        if bands == 0 {
            return Err(ClassifierError::InvalidParameter(
                "spectra must have at least one band".to_string(),
            ));
        }
        if features.len() != labels.len() * bands {
            return Err(ClassifierError::ShapeMismatch {
                expected: labels.len() * bands,
                found: features.len(),
            });
        }
        Ok(Self {
            features,
            labels,
            bands,
        })
    }

    /// Append one spectrum with its class.
    pub fn push(&mut self, spectrum: &[f32], label: usize) -> Result<(), ClassifierError> {
        if spectrum.len() != self.bands || self.bands == 0 {
            return Err(ClassifierError::ShapeMismatch {
                expected: self.bands,
                found: spectrum.len(),
            });
        }
        self.features.extend_from_slice(spectrum);
        self.labels.push(label);
        Ok(())
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the set holds no samples.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Spectrum length.
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// All labels in sample order.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// The flat feature buffer.
    pub fn features(&self) -> &[f32] {
        &self.features
    }

    /// Spectrum of sample `index`.
    pub fn spectrum(&self, index: usize) -> &[f32] {
        let start = index * self.bands;
        &self.features[start..start + self.bands]
    }

    /// Width of the output layer needed for these labels (`max + 1`).
    pub fn num_classes(&self) -> usize {
        self.labels.iter().max().map_or(0, |max| max + 1)
    }

    /// Sample count per class that actually occurs.
    pub fn class_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for &label in &self.labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    fn subset(&self, indices: &[usize]) -> Self {
        let mut features = Vec::with_capacity(indices.len() * self.bands);
        let mut labels = Vec::with_capacity(indices.len());
        for &index in indices {
            features.extend_from_slice(self.spectrum(index));
            labels.push(self.labels[index]);
        }
        Self {
            features,
            labels,
            bands: self.bands,
        }
    }

    /// Gather the samples at `indices` into an input batch and its targets.
    pub(crate) fn batch<B: Backend>(
        &self,
        indices: &[usize],
        device: &B::Device,
    ) -> (Tensor<B, 2>, Tensor<B, 1, Int>) {
        let mut values = Vec::with_capacity(indices.len() * self.bands);
        let mut targets = Vec::with_capacity(indices.len());
        for &index in indices {
            values.extend_from_slice(self.spectrum(index));
            targets.push(self.labels[index] as i64);
        }

        let spectra = Tensor::<B, 2>::from_data(
            TensorData::new(values, [indices.len(), self.bands]),
            device,
        );
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets, [indices.len()]), device);
        (spectra, targets)
    }
}

/// Result of [`stratified_split`].
#[derive(Debug, Clone)]
pub struct Split {
    /// Samples used for fitting
    pub train: SampleSet,
    /// Held-out samples used for accuracy
    pub test: SampleSet,
}

/// Partition `samples` into train and test sets, preserving each class's
/// share in both.
///
/// Every class ends up with at least one sample on each side, so a class
/// needs at least two samples. The partition is fully determined by `seed`.
pub fn stratified_split(
    samples: &SampleSet,
    test_fraction: f64,
    seed: u64,
) -> Result<Split, ClassifierError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ClassifierError::InvalidParameter(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }
    if samples.is_empty() {
        return Err(ClassifierError::insufficient("no labeled pixels"));
    }

    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, &label) in samples.labels().iter().enumerate() {
        by_class.entry(label).or_default().push(index);
    }

    if by_class.len() < 2 {
        return Err(ClassifierError::insufficient(format!(
            "need at least 2 classes to train, found {}",
            by_class.len()
        )));
    }
    if let Some((class, members)) = by_class.iter().find(|(_, members)| members.len() < 2) {
        return Err(ClassifierError::insufficient(format!(
            "class {} has {} labeled pixel(s); at least 2 are needed to stratify",
            class + 1,
            members.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_indices = Vec::with_capacity(samples.len());
    let mut test_indices = Vec::new();

    for members in by_class.values_mut() {
        members.shuffle(&mut rng);
        let n_test = ((members.len() as f64 * test_fraction).round() as usize)
            .clamp(1, members.len() - 1);
        test_indices.extend_from_slice(&members[..n_test]);
        train_indices.extend_from_slice(&members[n_test..]);
    }

    train_indices.shuffle(&mut rng);
    test_indices.shuffle(&mut rng);

    log::debug!(
        "Stratified split: {} train / {} test over {} classes",
        train_indices.len(),
        test_indices.len(),
        by_class.len()
    );

    Ok(Split {
        train: samples.subset(&train_indices),
        test: samples.subset(&test_indices),
    })
}
