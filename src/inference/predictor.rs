//! Egg detection on single images
//!
//! The predictor owns a loaded model and the preprocessing parameters from
//! its artifact manifest, so an image is normalized here exactly as it would
//! have been during training. The decision threshold defaults to 0.5 and can
//! be adjusted to trade recall against precision.

use std::path::Path;

use burn::tensor::{backend::Backend, Tensor};
use tracing::{debug, info};

use crate::dataset::image_to_pixels;
use crate::model::{ArtifactManifest, EggClassifier, ModelArtifact};
use crate::utils::error::{OvitrapError, Result};
use crate::DEFAULT_THRESHOLD;

/// Outcome of classifying one image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Whether the image is classified as containing eggs
    pub positive: bool,
    /// Model confidence that eggs are present, in `[0, 1]`
    pub probability: f32,
}

/// Classifier handle for repeated single-image inference
pub struct Predictor<B: Backend> {
    model: EggClassifier<B>,
    manifest: ArtifactManifest,
    threshold: f32,
    device: B::Device,
}

impl<B: Backend> Predictor<B> {
    /// Load a predictor from a persisted model artifact
    pub fn load(artifact: &ModelArtifact, device: &B::Device) -> Result<Self> {
        let (model, manifest) = artifact.load::<B>(device)?;
        manifest.preprocess.validate()?;

        info!(
            "Predictor ready: {}x{} input, threshold {}",
            manifest.preprocess.height,
            manifest.preprocess.width,
            DEFAULT_THRESHOLD
        );

        Ok(Self {
            model,
            manifest,
            threshold: DEFAULT_THRESHOLD,
            device: device.clone(),
        })
    }

    /// Replace the decision threshold.
    ///
    /// An image is positive only when its probability strictly exceeds the
    /// threshold, so a probability of exactly 0.5 is negative by default.
    pub fn with_threshold(mut self, threshold: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(OvitrapError::Config(format!(
                "threshold must be in [0.0, 1.0], got {}",
                threshold
            )));
        }
        self.threshold = threshold;
        Ok(self)
    }

    /// Current decision threshold
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Preprocessing parameters carried by the loaded artifact
    pub fn preprocess(&self) -> &crate::dataset::PreprocessConfig {
        &self.manifest.preprocess
    }

    /// Classify an image file.
    ///
    /// Unlike the training loader, an unreadable file is an error here; there
    /// is no meaningful prediction for a placeholder.
    pub fn predict_file<P: AsRef<Path>>(&self, path: P) -> Result<Detection> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| OvitrapError::ImageLoad(path.to_path_buf(), e.to_string()))?;

        let pixels = image_to_pixels(&img, &self.manifest.preprocess);
        let detection = self.predict_pixels(&pixels)?;

        debug!(
            "{:?}: probability {:.4} -> {}",
            path,
            detection.probability,
            if detection.positive { "eggs" } else { "no eggs" }
        );
        Ok(detection)
    }

    /// Classify an already-preprocessed pixel buffer.
    ///
    /// The buffer must have exactly the length the artifact's preprocessing
    /// configuration produces; anything else is a [`OvitrapError::ShapeMismatch`].
    pub fn predict_pixels(&self, pixels: &[f32]) -> Result<Detection> {
        let preprocess = &self.manifest.preprocess;
        if pixels.len() != preprocess.pixel_len() {
            return Err(OvitrapError::ShapeMismatch {
                expected: preprocess.pixel_len(),
                actual: pixels.len(),
                height: preprocess.height,
                width: preprocess.width,
                channels: preprocess.channels,
            });
        }

        let input = Tensor::<B, 1>::from_floats(pixels, &self.device).reshape([
            1,
            preprocess.channels,
            preprocess.height,
            preprocess.width,
        ]);

        let probability: f32 = self
            .model
            .forward_probability(input)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| OvitrapError::Inference(format!("{:?}", e)))?[0];

        Ok(Detection {
            positive: probability > self.threshold,
            probability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use crate::dataset::PreprocessConfig;
    use crate::model::EggClassifierConfig;
    use std::path::PathBuf;

    fn temp_stem(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ovitrap_predictor_{}_{}", std::process::id(), name))
    }

    fn saved_artifact(name: &str) -> ModelArtifact {
        let device = Default::default();
        let model_config = EggClassifierConfig::new();
        let model = model_config.init::<DefaultBackend>(&device);
        let artifact = ModelArtifact::at(temp_stem(name));
        artifact
            .save(&model, &model_config, &PreprocessConfig::default())
            .unwrap();
        artifact
    }

    fn cleanup(artifact: &ModelArtifact) {
        std::fs::remove_file(artifact.manifest_path()).ok();
        std::fs::remove_file(artifact.weights_path()).ok();
    }

    #[test]
    fn test_missing_artifact_is_an_error() {
        let device = Default::default();
        let artifact = ModelArtifact::at(temp_stem("nonexistent"));
        let result = Predictor::<DefaultBackend>::load(&artifact, &device);
        assert!(matches!(result, Err(OvitrapError::Artifact(_, _))));
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let device = Default::default();
        let artifact = saved_artifact("deterministic");
        let predictor = Predictor::<DefaultBackend>::load(&artifact, &device).unwrap();

        let pixels = vec![0.42f32; 64 * 64];
        let a = predictor.predict_pixels(&pixels).unwrap();
        let b = predictor.predict_pixels(&pixels).unwrap();

        assert_eq!(a.probability, b.probability);
        assert!((0.0..=1.0).contains(&a.probability));

        cleanup(&artifact);
    }

    #[test]
    fn test_wrong_buffer_length_is_shape_mismatch() {
        let device = Default::default();
        let artifact = saved_artifact("shape");
        let predictor = Predictor::<DefaultBackend>::load(&artifact, &device).unwrap();

        let result = predictor.predict_pixels(&[0.0f32; 100]);
        assert!(matches!(
            result,
            Err(OvitrapError::ShapeMismatch {
                expected: 4096,
                actual: 100,
                ..
            })
        ));

        cleanup(&artifact);
    }

    #[test]
    fn test_threshold_controls_decision() {
        let device = Default::default();
        let artifact = saved_artifact("threshold");
        let pixels = vec![0.5f32; 64 * 64];

        let lenient = Predictor::<DefaultBackend>::load(&artifact, &device)
            .unwrap()
            .with_threshold(0.0)
            .unwrap();
        assert!(lenient.predict_pixels(&pixels).unwrap().positive);

        let strict = Predictor::<DefaultBackend>::load(&artifact, &device)
            .unwrap()
            .with_threshold(1.0)
            .unwrap();
        assert!(!strict.predict_pixels(&pixels).unwrap().positive);

        let bad = Predictor::<DefaultBackend>::load(&artifact, &device)
            .unwrap()
            .with_threshold(1.5);
        assert!(matches!(bad, Err(OvitrapError::Config(_))));

        cleanup(&artifact);
    }

    #[test]
    fn test_probability_equal_to_threshold_is_negative() {
        let device = Default::default();
        let artifact = saved_artifact("boundary");
        let pixels = vec![0.5f32; 64 * 64];

        let predictor = Predictor::<DefaultBackend>::load(&artifact, &device).unwrap();
        let probability = predictor.predict_pixels(&pixels).unwrap().probability;

        // The comparison is strict: at exactly the threshold there is no call.
        let at_boundary = Predictor::<DefaultBackend>::load(&artifact, &device)
            .unwrap()
            .with_threshold(probability)
            .unwrap();
        assert!(!at_boundary.predict_pixels(&pixels).unwrap().positive);

        cleanup(&artifact);
    }
}
