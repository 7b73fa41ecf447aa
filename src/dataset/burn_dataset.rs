//! Burn dataset and batcher integration
//!
//! Adapts the loader's aligned collections to Burn's `Dataset` trait and
//! provides a batcher that assembles `[batch, 1, H, W]` image tensors with
//! float targets suitable for binary cross-entropy.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::tensor::{backend::Backend, Tensor};

use super::loader::SampleSet;
use super::PreprocessConfig;

/// A single sample ready for batching
#[derive(Clone, Debug)]
pub struct EggItem {
    /// Normalized pixel buffer, row-major H x W
    pub pixels: Vec<f32>,
    /// Binary label
    pub label: u8,
}

impl Dataset<EggItem> for SampleSet {
    fn get(&self, index: usize) -> Option<EggItem> {
        let pixels = self.images.get(index)?.clone();
        let label = *self.labels.get(index)?;
        Some(EggItem { pixels, label })
    }

    fn len(&self) -> usize {
        self.images.len()
    }
}

/// A batch of ovitrap images for training or evaluation
#[derive(Clone, Debug)]
pub struct EggBatch<B: Backend> {
    /// Images with shape [batch_size, 1, height, width]
    pub images: Tensor<B, 4>,
    /// Float targets (0.0 or 1.0) with shape [batch_size]
    pub targets: Tensor<B, 1>,
}

/// Batcher assembling [`EggBatch`]es from loader items
#[derive(Clone, Debug)]
pub struct EggBatcher {
    height: usize,
    width: usize,
}

impl EggBatcher {
    /// Create a batcher matching the given preprocessing configuration
    pub fn new(config: &PreprocessConfig) -> Self {
        Self {
            height: config.height,
            width: config.width,
        }
    }
}

impl<B: Backend> Batcher<B, EggItem, EggBatch<B>> for EggBatcher {
    fn batch(&self, items: Vec<EggItem>, device: &B::Device) -> EggBatch<B> {
        let batch_size = items.len();

        let mut pixels = Vec::with_capacity(batch_size * self.height * self.width);
        let mut targets = Vec::with_capacity(batch_size);

        for item in items {
            pixels.extend_from_slice(&item.pixels);
            targets.push(item.label as f32);
        }

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), device).reshape([
            batch_size,
            1,
            self.height,
            self.width,
        ]);
        let targets = Tensor::<B, 1>::from_floats(targets.as_slice(), device);

        EggBatch { images, targets }
    }
}
