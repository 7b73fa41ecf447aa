//! Dataset module for ovitrap image handling
//!
//! This module provides functionality for:
//! - Reading the CSV metadata table that drives training
//! - Loading images as normalized grayscale pixel buffers
//! - Deterministic train/holdout splitting
//! - Burn dataset and batcher integration
//!
//! Preprocessing parameters live in [`PreprocessConfig`], which is embedded in
//! the persisted model artifact so inference always normalizes images exactly
//! the way training did.

pub mod burn_dataset;
pub mod loader;
pub mod metadata;
pub mod split;

use serde::{Deserialize, Serialize};

use crate::utils::error::{OvitrapError, Result};

pub use burn_dataset::{EggBatch, EggBatcher, EggItem};
pub use loader::{image_to_pixels, load_samples, SampleSet};
pub use metadata::{load_metadata, MetadataRecord};
pub use split::{split, SplitConfig, SplitSets};

/// Shared preprocessing parameters for training and inference.
///
/// Every image entering the network is resized to `height` x `width`, decoded
/// as a single grayscale channel, and linearly rescaled from
/// `[0, intensity_scale]` to `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Target image height in pixels
    pub height: usize,
    /// Target image width in pixels
    pub width: usize,
    /// Number of input channels (1 for grayscale)
    pub channels: usize,
    /// Native intensity range upper bound (255 for 8-bit images)
    pub intensity_scale: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            height: crate::IMAGE_SIZE,
            width: crate::IMAGE_SIZE,
            channels: 1,
            intensity_scale: 255.0,
        }
    }
}

impl PreprocessConfig {
    /// Create a configuration for a square target size
    pub fn with_size(size: usize) -> Self {
        Self {
            height: size,
            width: size,
            ..Default::default()
        }
    }

    /// Number of float values in one preprocessed image
    pub fn pixel_len(&self) -> usize {
        self.height * self.width * self.channels
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.height == 0 || self.width == 0 {
            return Err(OvitrapError::Config(
                "image dimensions must be non-zero".to_string(),
            ));
        }
        if self.channels != 1 {
            return Err(OvitrapError::Config(format!(
                "only single-channel (grayscale) input is supported, got {} channels",
                self.channels
            )));
        }
        if self.intensity_scale <= 0.0 {
            return Err(OvitrapError::Config(
                "intensity_scale must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_default() {
        let config = PreprocessConfig::default();
        assert_eq!(config.height, 64);
        assert_eq!(config.width, 64);
        assert_eq!(config.channels, 1);
        assert_eq!(config.pixel_len(), 64 * 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_preprocess_validation() {
        let mut config = PreprocessConfig::default();
        config.height = 0;
        assert!(config.validate().is_err());

        let mut config = PreprocessConfig::default();
        config.channels = 3;
        assert!(config.validate().is_err());

        let mut config = PreprocessConfig::default();
        config.intensity_scale = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_preprocess_roundtrip() {
        let config = PreprocessConfig::with_size(32);
        let json = serde_json::to_string(&config).unwrap();
        let back: PreprocessConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
