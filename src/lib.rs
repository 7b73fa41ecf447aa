//! # Ovitrap Screen
//!
//! A Rust library for screening ovitrap microscope/field images for
//! dengue-vector mosquito eggs using a convolutional network built with the
//! Burn framework.
//!
//! The pipeline is deliberately small and reproducible:
//!
//! 1. A CSV metadata table lists `(file_path, label)` pairs.
//! 2. The loader turns each image into a normalized grayscale pixel buffer,
//!    substituting a zero-filled placeholder (with a warning) when a file is
//!    missing so image/label alignment is never broken.
//! 3. A seeded splitter partitions the samples into training and holdout sets.
//! 4. The trainer fits a small CNN with binary cross-entropy and persists the
//!    architecture, preprocessing parameters, and weights as one artifact.
//! 5. The predictor reloads that artifact and classifies single images with a
//!    configurable probability threshold.
//!
//! ## Modules
//!
//! - `dataset`: metadata table, image loading/normalization, splitting, and
//!   Burn dataset/batcher integration
//! - `model`: CNN architecture and artifact persistence
//! - `training`: training loop and per-epoch history
//! - `inference`: single-image prediction
//! - `utils`: errors and logging

pub mod backend;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

pub use dataset::loader::{image_to_pixels, load_samples, SampleSet};
pub use dataset::metadata::{load_metadata, MetadataRecord};
pub use dataset::split::{split, SplitConfig, SplitSets};
pub use dataset::PreprocessConfig;
pub use dataset::{EggBatch, EggBatcher, EggItem};
pub use inference::{Detection, Predictor};
pub use model::artifact::{ArtifactManifest, ModelArtifact};
pub use model::cnn::{EggClassifier, EggClassifierConfig};
pub use training::{train, EpochRecord, TrainConfig, TrainingHistory};
pub use utils::error::{OvitrapError, Result};

/// Default side length of the square input tensor.
pub const IMAGE_SIZE: usize = 64;

/// Default probability threshold for calling an image positive.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
