//! hyperleaf_nn - per-pixel spectral classifier.
//!
//! A small 1-D convolutional network that treats one pixel's reflectance
//! vector as a single-channel signal over the spectral axis. Models are
//! trained from scratch for every analysis request and never persisted.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hyperleaf_nn::{SampleSet, TrainingConfig, train};
//!
//! let mut samples = SampleSet::new(bands);
//! samples.push(&spectrum, class)?;
//! let classifier = train(&samples, &TrainingConfig::default())?;
//! let predicted = classifier.predict(&spectra)?;
//! ```

mod dataset;
mod error;
mod model;
mod train;

pub use dataset::{SampleSet, Split, stratified_split};
pub use error::ClassifierError;
pub use model::{PixelCnn, PixelCnnConfig};
pub use train::{MAX_CLASSES, TrainedClassifier, TrainingConfig, train};

/// Backend used while fitting (autodiff over the CPU ndarray backend).
pub type TrainingBackend = burn::backend::Autodiff<burn::backend::NdArray>;

/// Backend used for evaluation and full-scene inference.
pub type InferenceBackend = burn::backend::NdArray;
