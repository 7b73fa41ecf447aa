//! Model artifact persistence
//!
//! A trained model is persisted as two sibling files sharing a stem:
//! `<stem>.json` holds the manifest (architecture configuration, the exact
//! preprocessing parameters the model was trained with, and a timestamp)
//! and `<stem>.mpk` holds the weights via Burn's [`CompactRecorder`].
//! Saving overwrites both files, so retraining replaces the artifact.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::backend::Backend;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::cnn::{EggClassifier, EggClassifierConfig};
use crate::dataset::PreprocessConfig;
use crate::utils::error::{OvitrapError, Result};

/// Everything needed to reconstruct a trained classifier except the weights
#[derive(Debug, Serialize, Deserialize)]
pub struct ArtifactManifest {
    /// Architecture configuration used to rebuild the network
    pub model: EggClassifierConfig,
    /// Preprocessing parameters inference must replicate
    pub preprocess: PreprocessConfig,
    /// When the model finished training
    pub trained_at: DateTime<Utc>,
}

/// Handle to an on-disk model artifact, addressed by its path stem
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    stem: PathBuf,
}

impl ModelArtifact {
    /// Address an artifact by its path stem (no extension)
    pub fn at<P: AsRef<Path>>(stem: P) -> Self {
        Self {
            stem: stem.as_ref().to_path_buf(),
        }
    }

    /// Path of the JSON manifest
    pub fn manifest_path(&self) -> PathBuf {
        self.stem.with_extension("json")
    }

    /// Path of the weights file written by [`CompactRecorder`]
    pub fn weights_path(&self) -> PathBuf {
        self.stem.with_extension("mpk")
    }

    /// Whether both artifact files are present
    pub fn exists(&self) -> bool {
        self.manifest_path().exists() && self.weights_path().exists()
    }

    /// Derive a sibling artifact for an intermediate checkpoint
    pub fn checkpoint(&self, epoch: usize) -> ModelArtifact {
        let mut stem = self.stem.as_os_str().to_os_string();
        stem.push(format!("_epoch{:03}", epoch));
        ModelArtifact { stem: stem.into() }
    }

    /// Persist a trained model, overwriting any previous artifact.
    ///
    /// Rejects a model/preprocess pair whose input dimensions disagree, since
    /// such an artifact could never be loaded for inference.
    pub fn save<B: Backend>(
        &self,
        model: &EggClassifier<B>,
        model_config: &EggClassifierConfig,
        preprocess: &PreprocessConfig,
    ) -> Result<()> {
        preprocess.validate()?;
        if model_config.input_size != preprocess.height
            || model_config.input_size != preprocess.width
            || model_config.in_channels != preprocess.channels
        {
            return Err(OvitrapError::Config(format!(
                "model expects {}x{}x{} input but preprocessing produces {}x{}x{}",
                model_config.in_channels,
                model_config.input_size,
                model_config.input_size,
                preprocess.channels,
                preprocess.height,
                preprocess.width
            )));
        }

        let manifest = ArtifactManifest {
            model: model_config.clone(),
            preprocess: preprocess.clone(),
            trained_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| OvitrapError::Serialization(e.to_string()))?;
        std::fs::write(self.manifest_path(), json)?;

        model
            .clone()
            .save_file(&self.stem, &CompactRecorder::new())
            .map_err(|e| OvitrapError::Artifact(self.weights_path(), e.to_string()))?;

        info!("Saved model artifact to {:?}", self.stem);
        Ok(())
    }

    /// Load the manifest and rebuild the trained model on `device`
    pub fn load<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<(EggClassifier<B>, ArtifactManifest)> {
        let json = std::fs::read_to_string(self.manifest_path()).map_err(|e| {
            OvitrapError::Artifact(
                self.manifest_path(),
                format!("cannot read manifest: {}", e),
            )
        })?;
        let manifest: ArtifactManifest = serde_json::from_str(&json)
            .map_err(|e| OvitrapError::Artifact(self.manifest_path(), e.to_string()))?;

        let model = manifest
            .model
            .init::<B>(device)
            .load_file(&self.stem, &CompactRecorder::new(), device)
            .map_err(|e| OvitrapError::Artifact(self.weights_path(), e.to_string()))?;

        info!(
            "Loaded model artifact from {:?} (trained {})",
            self.stem, manifest.trained_at
        );
        Ok((model, manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use burn::tensor::Tensor;

    fn temp_stem(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ovitrap_artifact_{}_{}", std::process::id(), name))
    }

    fn cleanup(artifact: &ModelArtifact) {
        std::fs::remove_file(artifact.manifest_path()).ok();
        std::fs::remove_file(artifact.weights_path()).ok();
    }

    #[test]
    fn test_save_load_round_trip() {
        let device = Default::default();
        let model_config = EggClassifierConfig::new();
        let preprocess = PreprocessConfig::default();
        let model = model_config.init::<DefaultBackend>(&device);

        let artifact = ModelArtifact::at(temp_stem("roundtrip"));
        artifact.save(&model, &model_config, &preprocess).unwrap();
        assert!(artifact.exists());

        let (loaded, manifest) = artifact.load::<DefaultBackend>(&device).unwrap();
        assert_eq!(manifest.preprocess, preprocess);
        assert_eq!(manifest.model.input_size, 64);

        // Same weights, same probabilities.
        let input = Tensor::<DefaultBackend, 4>::ones([1, 1, 64, 64], &device);
        let before: Vec<f32> = model
            .forward_probability(input.clone())
            .into_data()
            .to_vec()
            .unwrap();
        let after: Vec<f32> = loaded
            .forward_probability(input)
            .into_data()
            .to_vec()
            .unwrap();
        assert_eq!(before, after);

        cleanup(&artifact);
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let device = Default::default();
        let model_config = EggClassifierConfig::new();
        let model = model_config.init::<DefaultBackend>(&device);
        let preprocess = PreprocessConfig::with_size(32);

        let artifact = ModelArtifact::at(temp_stem("mismatch"));
        let result = artifact.save(&model, &model_config, &preprocess);
        assert!(matches!(result, Err(OvitrapError::Config(_))));

        cleanup(&artifact);
    }

    #[test]
    fn test_load_missing_artifact_is_an_error() {
        let device = Default::default();
        let artifact = ModelArtifact::at(temp_stem("missing"));
        let result = artifact.load::<DefaultBackend>(&device);
        assert!(matches!(result, Err(OvitrapError::Artifact(_, _))));
    }
}
