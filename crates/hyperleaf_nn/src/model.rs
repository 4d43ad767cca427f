//! 1-D convolutional network over the spectral axis.

use burn::module::Module;
use burn::nn::conv::{Conv1d, Conv1dConfig};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig1d, Relu};
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

/// Output channels of the first convolution.
pub const CONV1_CHANNELS: usize = 16;

/// Output channels of the second convolution.
pub const CONV2_CHANNELS: usize = 32;

/// Kernel width of both convolutions.
pub const KERNEL_SIZE: usize = 3;

/// Shape and regularisation parameters for [`PixelCnn`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelCnnConfig {
    /// Spectrum length (input width)
    pub bands: usize,
    /// Number of output logits
    pub num_classes: usize,
    /// Width of the hidden fully connected layer
    pub hidden: usize,
    /// Dropout probability applied after the hidden layer
    pub dropout: f64,
}

impl PixelCnnConfig {
    /// Create a config with the default hidden width (128) and dropout (0.5).
    pub fn new(bands: usize, num_classes: usize) -> Self {
        Self {
            bands,
            num_classes,
            hidden: 128,
            dropout: 0.5,
        }
    }

    /// Set the hidden layer width.
    pub fn with_hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }

    /// Set the dropout probability.
    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    /// Initialise a freshly randomised network on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> PixelCnn<B> {
        // padding of 1 keeps the spectral length unchanged for a width-3 kernel
        let padding = PaddingConfig1d::Explicit(KERNEL_SIZE / 2);

        PixelCnn {
            conv1: Conv1dConfig::new(1, CONV1_CHANNELS, KERNEL_SIZE)
                .with_padding(padding.clone())
                .init(device),
            conv2: Conv1dConfig::new(CONV1_CHANNELS, CONV2_CHANNELS, KERNEL_SIZE)
                .with_padding(padding)
                .init(device),
            fc1: LinearConfig::new(CONV2_CHANNELS * self.bands, self.hidden).init(device),
            fc2: LinearConfig::new(self.hidden, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            activation: Relu::new(),
        }
    }
}

/// Per-pixel classifier: two convolutions, a hidden dense layer with
/// dropout, and a linear output layer producing one logit per class.
#[derive(Module, Debug)]
pub struct PixelCnn<B: Backend> {
    conv1: Conv1d<B>,
    conv2: Conv1d<B>,
    fc1: Linear<B>,
    fc2: Linear<B>,
    dropout: Dropout,
    activation: Relu,
}

impl<B: Backend> PixelCnn<B> {
    /// Map a `[batch, bands]` tensor of spectra to `[batch, num_classes]` logits.
    ///
    /// Dropout is only active on autodiff backends, so running the
    /// `valid()` copy of a trained model is inference mode.
    pub fn forward(&self, spectra: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, bands] = spectra.dims();

        let x = spectra.reshape([batch, 1, bands]);
        let x = self.activation.forward(self.conv1.forward(x));
        let x = self.activation.forward(self.conv2.forward(x));
        let x = x.reshape([batch, CONV2_CHANNELS * bands]);
        let x = self.activation.forward(self.fc1.forward(x));
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }
}
