//! CNN architecture for binary egg detection
//!
//! A compact two-block convolutional network over 64x64 grayscale input:
//! two Conv-ReLU-MaxPool stages followed by a dense head that emits a single
//! logit per image. Convolutions use no padding, so each 3x3 kernel trims the
//! feature map by two pixels before pooling halves it.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, Relu,
    },
    tensor::{activation::sigmoid, backend::Backend, Tensor},
};

/// Configuration for the egg classifier CNN
#[derive(Config, Debug)]
pub struct EggClassifierConfig {
    /// Input image size (assumes square images)
    #[config(default = "64")]
    pub input_size: usize,

    /// Number of input channels (1 for grayscale)
    #[config(default = "1")]
    pub in_channels: usize,

    /// Filters in the first convolutional block
    #[config(default = "32")]
    pub conv1_filters: usize,

    /// Filters in the second convolutional block
    #[config(default = "64")]
    pub conv2_filters: usize,

    /// Square kernel size for both convolutions
    #[config(default = "3")]
    pub kernel_size: usize,

    /// Units in the hidden dense layer
    #[config(default = "128")]
    pub hidden_units: usize,

    /// Dropout rate applied before the output layer
    #[config(default = "0.5")]
    pub dropout_rate: f64,
}

impl EggClassifierConfig {
    /// Spatial side length of the feature map after both conv/pool stages.
    ///
    /// Each stage applies an unpadded convolution (side - kernel + 1) and a
    /// 2x2 max pool with stride 2 (floor division).
    pub fn feature_map_size(&self) -> usize {
        let after_block1 = (self.input_size - self.kernel_size + 1) / 2;
        (after_block1 - self.kernel_size + 1) / 2
    }

    /// Flattened feature count entering the dense head
    pub fn flattened_features(&self) -> usize {
        let side = self.feature_map_size();
        self.conv2_filters * side * side
    }

    /// Initialize the model on the given device
    pub fn init<B: Backend>(&self, device: &B::Device) -> EggClassifier<B> {
        let conv1 = Conv2dConfig::new(
            [self.in_channels, self.conv1_filters],
            [self.kernel_size, self.kernel_size],
        )
        .init(device);
        let conv2 = Conv2dConfig::new(
            [self.conv1_filters, self.conv2_filters],
            [self.kernel_size, self.kernel_size],
        )
        .init(device);

        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        let fc1 = LinearConfig::new(self.flattened_features(), self.hidden_units).init(device);
        let dropout = DropoutConfig::new(self.dropout_rate).init();
        let fc2 = LinearConfig::new(self.hidden_units, 1).init(device);

        EggClassifier {
            conv1,
            conv2,
            pool,
            fc1,
            dropout,
            fc2,
            relu: Relu::new(),
        }
    }
}

/// Binary classifier deciding whether an ovitrap image contains eggs
#[derive(Module, Debug)]
pub struct EggClassifier<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    pool: MaxPool2d,
    fc1: Linear<B>,
    dropout: Dropout,
    fc2: Linear<B>,
    relu: Relu,
}

impl<B: Backend> EggClassifier<B> {
    /// Forward pass producing raw logits.
    ///
    /// Input shape `[batch, 1, H, W]`, output shape `[batch, 1]`.
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        // Block 1: 64 -> 62 -> 31
        let x = self.conv1.forward(x);
        let x = self.relu.forward(x);
        let x = self.pool.forward(x);

        // Block 2: 31 -> 29 -> 14
        let x = self.conv2.forward(x);
        let x = self.relu.forward(x);
        let x = self.pool.forward(x);

        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);

        let x = self.fc1.forward(x);
        let x = self.relu.forward(x);
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }

    /// Forward pass producing per-image egg probabilities in `[0, 1]`.
    ///
    /// Output shape `[batch]`.
    pub fn forward_probability(&self, x: Tensor<B, 4>) -> Tensor<B, 1> {
        let logits = self.forward(x);
        let [batch_size, _] = logits.dims();
        sigmoid(logits).reshape([batch_size])
    }
}
