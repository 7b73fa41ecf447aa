//! Image loading and normalization
//!
//! Converts metadata rows into aligned collections of normalized grayscale
//! pixel buffers and labels. A missing image file is not fatal: the row gets
//! an all-zero placeholder buffer and a warning, keeping image/label
//! alignment intact. The same conversion routine is reused verbatim by the
//! inference engine.

use image::{imageops::FilterType, DynamicImage};
use tracing::{info, warn};

use super::metadata::MetadataRecord;
use super::PreprocessConfig;
use crate::utils::error::Result;

/// Aligned image/label collections produced by the loader.
///
/// Invariant: `images.len() == labels.len()`, in metadata row order. Every
/// pixel buffer has length `height * width` with values in `[0.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct SampleSet {
    /// One normalized pixel buffer per metadata row (row-major H x W)
    pub images: Vec<Vec<f32>>,
    /// One label per metadata row, aligned by position
    pub labels: Vec<u8>,
}

impl SampleSet {
    /// Create an empty sample set
    pub fn new() -> Self {
        Self {
            images: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Count of positive (label 1) samples
    pub fn num_positive(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }
}

impl Default for SampleSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a decoded image to a normalized grayscale pixel buffer.
///
/// Resizes to exactly `config.height` x `config.width` with deterministic
/// triangle resampling, decodes as single-channel intensity, and rescales
/// linearly to `[0.0, 1.0]`. Returns a row-major `H * W` buffer.
pub fn image_to_pixels(img: &DynamicImage, config: &PreprocessConfig) -> Vec<f32> {
    let gray = img
        .resize_exact(
            config.width as u32,
            config.height as u32,
            FilterType::Triangle,
        )
        .to_luma8();

    gray.pixels()
        .map(|p| p[0] as f32 / config.intensity_scale)
        .collect()
}

/// Load every metadata row as a normalized pixel buffer.
///
/// Rows whose file is missing (or cannot be decoded) get an all-zero buffer
/// and a warning; their label is kept so the two collections stay aligned.
/// Fails only on an invalid `config`; otherwise this is a pure function of
/// `(records, config)` apart from the warnings.
pub fn load_samples(records: &[MetadataRecord], config: &PreprocessConfig) -> Result<SampleSet> {
    config.validate()?;

    let mut samples = SampleSet::new();
    let mut placeholders = 0usize;

    for record in records {
        let pixels = match image::open(&record.file_path) {
            Ok(img) => image_to_pixels(&img, config),
            Err(e) => {
                warn!(
                    "{:?} not usable ({}), substituting zero placeholder",
                    record.file_path, e
                );
                placeholders += 1;
                vec![0.0f32; config.pixel_len()]
            }
        };

        samples.images.push(pixels);
        samples.labels.push(record.label);
    }

    info!(
        "Loaded {} samples ({} positive, {} placeholder)",
        samples.len(),
        samples.num_positive(),
        placeholders
    );

    Ok(samples)
}
