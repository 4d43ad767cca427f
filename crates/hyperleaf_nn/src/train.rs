//! Training loop, held-out evaluation and batched inference.

use std::sync::{Mutex, PoisonError};

use burn::backend::ndarray::NdArrayDevice;
use burn::module::AutodiffModule;
use burn::nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor, TensorData};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::dataset::{SampleSet, stratified_split};
use crate::error::ClassifierError;
use crate::model::{PixelCnn, PixelCnnConfig};
use crate::{InferenceBackend, TrainingBackend};

/// Pixels per forward pass during evaluation and full-scene inference.
const INFERENCE_BATCH: usize = 1024;

/// Largest output layer the classifier will build.
pub const MAX_CLASSES: usize = u16::MAX as usize;

/// The backend RNG behind weight init and dropout is process-wide, so
/// seeded training runs take turns.
static BACKEND_RNG: Mutex<()> = Mutex::new(());

/// Hyper-parameters for one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of passes over the training split
    pub epochs: usize,
    /// Mini-batch size
    pub batch_size: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Seed for the split, the shuffles and weight initialisation
    pub seed: u64,
    /// Fraction of each class held out for evaluation
    pub test_fraction: f64,
    /// Width of the hidden dense layer
    pub hidden_units: usize,
    /// Dropout probability during training
    pub dropout: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 20,
            batch_size: 64,
            learning_rate: 1e-3,
            seed: 42,
            test_fraction: 0.2,
            hidden_units: 128,
            dropout: 0.5,
        }
    }
}

impl TrainingConfig {
    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.epochs == 0 {
            return Err(ClassifierError::InvalidParameter(
                "epochs must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ClassifierError::InvalidParameter(
                "batch size must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ClassifierError::InvalidParameter(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ClassifierError::InvalidParameter(format!(
                "test fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.hidden_units == 0 {
            return Err(ClassifierError::InvalidParameter(
                "hidden units must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ClassifierError::InvalidParameter(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }
}

/// A classifier fitted for a single request.
///
/// Holds the inference copy of the network; there is no way to save or
/// share it.
#[derive(Debug)]
pub struct TrainedClassifier {
    model: PixelCnn<InferenceBackend>,
    device: NdArrayDevice,
    bands: usize,
    num_classes: usize,
    accuracy: f64,
    loss_history: Vec<f64>,
    train_size: usize,
    test_size: usize,
}

impl TrainedClassifier {
    /// Accuracy on the held-out split.
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Spectrum length the model expects.
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Mean training loss of each epoch.
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    /// Sizes of the train and test splits.
    pub fn split_sizes(&self) -> (usize, usize) {
        (self.train_size, self.test_size)
    }

    /// Predict a class for each spectrum in a flat buffer of
    /// `n * bands` values.
    pub fn predict(&self, spectra: &[f32]) -> Result<Vec<usize>, ClassifierError> {
        if spectra.len() % self.bands != 0 {
            return Err(ClassifierError::InvalidParameter(format!(
                "spectra buffer of {} values is not a multiple of {} bands",
                spectra.len(),
                self.bands
            )));
        }
        Ok(predict_batched(&self.model, spectra, self.bands, &self.device))
    }
}

/// Split `samples`, fit a fresh network on the training part and measure
/// accuracy on the rest.
pub fn train(
    samples: &SampleSet,
    config: &TrainingConfig,
) -> Result<TrainedClassifier, ClassifierError> {
    config.validate()?;
    let num_classes = samples.num_classes();
    if num_classes > MAX_CLASSES {
        return Err(ClassifierError::InvalidParameter(format!(
            "label value {} exceeds the supported maximum of {}",
            num_classes,
            MAX_CLASSES
        )));
    }
    let split = stratified_split(samples, config.test_fraction, config.seed)?;

    let bands = samples.bands();
    let device = NdArrayDevice::default();

    log::info!(
        "Training pixel classifier: {} bands, {} classes, {} train / {} test samples",
        bands,
        num_classes,
        split.train.len(),
        split.test.len()
    );

    let (model, loss_history) = fit::<TrainingBackend>(&split.train, num_classes, config, &device);
    let model: PixelCnn<InferenceBackend> = model.valid();

    let predictions = predict_batched(&model, split.test.features(), bands, &device);
    let accuracy = accuracy(&predictions, split.test.labels());
    log::info!("Held-out accuracy: {:.4}", accuracy);

    Ok(TrainedClassifier {
        model,
        device,
        bands,
        num_classes,
        accuracy,
        loss_history,
        train_size: split.train.len(),
        test_size: split.test.len(),
    })
}

fn fit<B: AutodiffBackend>(
    train: &SampleSet,
    num_classes: usize,
    config: &TrainingConfig,
    device: &B::Device,
) -> (PixelCnn<B>, Vec<f64>) {
    let _rng = BACKEND_RNG.lock().unwrap_or_else(PoisonError::into_inner);
    B::seed(config.seed);

    let mut model: PixelCnn<B> = PixelCnnConfig::new(train.bands(), num_classes)
        .with_hidden(config.hidden_units)
        .with_dropout(config.dropout)
        .init(device);
    let mut optim = AdamConfig::new().init();
    let loss_fn: CrossEntropyLoss<B> = CrossEntropyLossConfig::new().init(device);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut order: Vec<usize> = (0..train.len()).collect();
    let mut history = Vec::with_capacity(config.epochs);

    for epoch in 0..config.epochs {
        order.shuffle(&mut rng);

        let mut total_loss = 0.0;
        let mut batches = 0usize;
        for chunk in order.chunks(config.batch_size) {
            let (spectra, targets) = train.batch::<B>(chunk, device);
            let logits = model.forward(spectra);
            let loss = loss_fn.forward(logits, targets);

            total_loss += loss.clone().into_scalar().elem::<f64>();
            batches += 1;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(config.learning_rate, model, grads);
        }

        let mean_loss = total_loss / batches.max(1) as f64;
        log::info!(
            "Epoch {}/{}, loss: {:.4}",
            epoch + 1,
            config.epochs,
            mean_loss
        );
        history.push(mean_loss);
    }

    (model, history)
}

fn predict_batched<B: Backend>(
    model: &PixelCnn<B>,
    spectra: &[f32],
    bands: usize,
    device: &B::Device,
) -> Vec<usize> {
    let mut predictions = Vec::with_capacity(spectra.len() / bands.max(1));
    if bands == 0 {
        return predictions;
    }

    for chunk in spectra.chunks(INFERENCE_BATCH * bands) {
        let rows = chunk.len() / bands;
        let input =
            Tensor::<B, 2>::from_data(TensorData::new(chunk.to_vec(), [rows, bands]), device);
        let classes = model.forward(input).argmax(1).flatten::<1>(0, 1);
        predictions.extend(classes.into_data().iter::<i64>().map(|class| class as usize));
    }
    predictions
}

fn accuracy(predictions: &[usize], labels: &[usize]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|(predicted, actual)| predicted == actual)
        .count();
    correct as f64 / labels.len() as f64
}
