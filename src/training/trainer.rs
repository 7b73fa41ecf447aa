//! Supervised training loop
//!
//! Trains the egg classifier with Adam on binary cross-entropy. Batch order
//! is reshuffled every epoch with a seeded ChaCha8 generator, so a run is
//! reproducible up to the backend's weight initialization. After the final
//! epoch the model is persisted as an artifact; optional intermediate
//! checkpoints can be written every N epochs.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::activation::{log_sigmoid, sigmoid};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::history::{EpochRecord, TrainingHistory};
use crate::dataset::{EggBatch, EggBatcher, EggItem, PreprocessConfig, SampleSet, SplitSets};
use crate::model::{EggClassifier, EggClassifierConfig, ModelArtifact};
use crate::utils::error::{OvitrapError, Result};

/// Hyperparameters of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Number of passes over the training partition
    pub epochs: usize,
    /// Samples per weight update
    pub batch_size: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Seed for per-epoch batch shuffling
    pub seed: u64,
    /// Write an intermediate artifact every N epochs (disabled by default)
    pub checkpoint_interval: Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            learning_rate: 1e-3,
            seed: 42,
            checkpoint_interval: None,
        }
    }
}

impl TrainConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(OvitrapError::Config("epochs must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(OvitrapError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.learning_rate <= 0.0 {
            return Err(OvitrapError::Config(
                "learning_rate must be positive".to_string(),
            ));
        }
        if self.checkpoint_interval == Some(0) {
            return Err(OvitrapError::Config(
                "checkpoint_interval must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Mean binary cross-entropy from raw logits.
///
/// Computed as `-mean(y * log_sigmoid(x) + (1 - y) * log_sigmoid(-x))`,
/// which stays finite for saturated logits.
fn bce_with_logits<B: Backend>(logits: Tensor<B, 1>, targets: Tensor<B, 1>) -> Tensor<B, 1> {
    let ones = targets.ones_like();
    let per_sample = targets.clone() * log_sigmoid(logits.clone())
        + (ones - targets) * log_sigmoid(logits.neg());
    per_sample.mean().neg()
}

/// Loss and accuracy of one batch, with predictions thresholded at 0.5
fn batch_metrics<B: Backend>(
    logits: Tensor<B, 1>,
    targets: &Tensor<B, 1>,
) -> Result<(f64, usize)> {
    let loss: f64 = bce_with_logits(logits.clone(), targets.clone())
        .into_scalar()
        .elem::<f64>();

    let probs: Vec<f32> = sigmoid(logits)
        .into_data()
        .to_vec()
        .map_err(|e| OvitrapError::Training(format!("{:?}", e)))?;
    let labels: Vec<f32> = targets
        .clone()
        .into_data()
        .to_vec()
        .map_err(|e| OvitrapError::Training(format!("{:?}", e)))?;

    let correct = probs
        .iter()
        .zip(&labels)
        .filter(|&(&p, &y)| (p >= 0.5) == (y >= 0.5))
        .count();

    Ok((loss, correct))
}

/// Mean loss and accuracy over a full partition, without gradient tracking
fn evaluate<B: Backend>(
    model: &EggClassifier<B>,
    samples: &SampleSet,
    batcher: &EggBatcher,
    batch_size: usize,
    device: &B::Device,
) -> Result<(f64, f64)> {
    let n = samples.len();
    let mut total_loss = 0.0;
    let mut total_correct = 0usize;

    let indices: Vec<usize> = (0..n).collect();
    for chunk in indices.chunks(batch_size) {
        let items: Vec<EggItem> = chunk
            .iter()
            .filter_map(|&i| Dataset::get(samples, i))
            .collect();
        let batch: EggBatch<B> = batcher.batch(items, device);

        let logits = model.forward(batch.images);
        let [batch_len, _] = logits.dims();
        let logits = logits.reshape([batch_len]);

        let (loss, correct) = batch_metrics(logits, &batch.targets)?;
        total_loss += loss * batch_len as f64;
        total_correct += correct;
    }

    Ok((total_loss / n as f64, total_correct as f64 / n as f64))
}

/// Train a classifier on the given partitions and persist it as an artifact.
///
/// Returns the trained model and the per-epoch metric history. The artifact
/// (and any intermediate checkpoints) embed `preprocess`, so inference will
/// reproduce the exact preprocessing used here.
pub fn train<B: AutodiffBackend>(
    splits: &SplitSets,
    model_config: &EggClassifierConfig,
    preprocess: &PreprocessConfig,
    config: &TrainConfig,
    artifact: &ModelArtifact,
    device: &B::Device,
) -> Result<(EggClassifier<B>, TrainingHistory)> {
    config.validate()?;
    preprocess.validate()?;

    if splits.train.is_empty() {
        return Err(OvitrapError::Training(
            "training partition is empty".to_string(),
        ));
    }

    let batcher = EggBatcher::new(preprocess);
    let mut model = model_config.init::<B>(device);
    let mut optimizer = AdamConfig::new().init();
    let mut history = TrainingHistory::new();

    info!(
        "Training on {} samples ({} holdout) for {} epochs, batch size {}",
        splits.train.len(),
        splits.holdout.len(),
        config.epochs,
        config.batch_size
    );

    let n_train = splits.train.len();
    for epoch in 1..=config.epochs {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(epoch as u64));
        let mut indices: Vec<usize> = (0..n_train).collect();
        indices.shuffle(&mut rng);

        let mut epoch_loss = 0.0;
        let mut epoch_correct = 0usize;

        for chunk in indices.chunks(config.batch_size) {
            let items: Vec<EggItem> = chunk
                .iter()
                .filter_map(|&i| Dataset::get(&splits.train, i))
                .collect();
            let batch: EggBatch<B> = batcher.batch(items, device);

            let logits = model.forward(batch.images);
            let [batch_len, _] = logits.dims();
            let logits = logits.reshape([batch_len]);

            let loss = bce_with_logits(logits.clone(), batch.targets.clone());

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);

            let (loss_value, correct) = batch_metrics(logits, &batch.targets)?;
            epoch_loss += loss_value * batch_len as f64;
            epoch_correct += correct;
        }

        let train_loss = epoch_loss / n_train as f64;
        let train_accuracy = epoch_correct as f64 / n_train as f64;

        let (holdout_loss, holdout_accuracy) = if splits.holdout.is_empty() {
            (f64::NAN, f64::NAN)
        } else {
            evaluate(
                &model.valid(),
                &splits.holdout,
                &batcher,
                config.batch_size,
                device,
            )?
        };

        info!(
            "Epoch {}/{}: train loss {:.4}, train acc {:.4}, holdout loss {:.4}, holdout acc {:.4}",
            epoch, config.epochs, train_loss, train_accuracy, holdout_loss, holdout_accuracy
        );

        history.push(EpochRecord {
            epoch,
            train_loss,
            train_accuracy,
            holdout_loss,
            holdout_accuracy,
        });

        if let Some(interval) = config.checkpoint_interval {
            if epoch % interval == 0 && epoch < config.epochs {
                artifact
                    .checkpoint(epoch)
                    .save(&model, model_config, preprocess)?;
            }
        }
    }

    artifact.save(&model, model_config, preprocess)?;
    Ok((model, history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TrainingBackend;
    use crate::dataset::{split, SplitConfig};
    use std::path::PathBuf;

    fn temp_stem(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ovitrap_trainer_{}_{}", std::process::id(), name))
    }

    fn synthetic_splits(n: usize, size: usize) -> SplitSets {
        let mut samples = SampleSet::new();
        for i in 0..n {
            let value = if i % 2 == 0 { 0.9 } else { 0.1 };
            samples.images.push(vec![value; size * size]);
            samples.labels.push((i % 2) as u8);
        }
        split(samples, &SplitConfig::default()).unwrap()
    }

    #[test]
    fn test_bce_matches_hand_computation() {
        let device = Default::default();
        let logits =
            Tensor::<TrainingBackend, 1>::from_floats([0.0f32, 0.0], &device);
        let targets = Tensor::<TrainingBackend, 1>::from_floats([1.0f32, 0.0], &device);

        // sigmoid(0) = 0.5 on both sides, so the mean BCE is ln(2).
        let loss: f32 = bce_with_logits(logits, targets).into_scalar().elem();
        assert!((loss - std::f32::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_train_one_epoch_produces_artifact_and_history() {
        let device = Default::default();
        let splits = synthetic_splits(10, 16);
        let model_config = EggClassifierConfig::new().with_input_size(16);
        let preprocess = PreprocessConfig::with_size(16);
        let config = TrainConfig {
            epochs: 1,
            batch_size: 4,
            ..Default::default()
        };
        let artifact = ModelArtifact::at(temp_stem("one_epoch"));

        let (_model, history) = train::<TrainingBackend>(
            &splits,
            &model_config,
            &preprocess,
            &config,
            &artifact,
            &device,
        )
        .unwrap();

        assert_eq!(history.records.len(), 1);
        let record = history.last().unwrap();
        assert!(record.train_loss.is_finite());
        assert!((0.0..=1.0).contains(&record.train_accuracy));
        assert!(record.holdout_loss.is_finite());
        assert!((0.0..=1.0).contains(&record.holdout_accuracy));
        assert!(artifact.exists());

        std::fs::remove_file(artifact.manifest_path()).ok();
        std::fs::remove_file(artifact.weights_path()).ok();
    }

    #[test]
    fn test_end_to_end_from_metadata_table() {
        use crate::dataset::{load_metadata, load_samples};
        use image::{ImageBuffer, Luma};
        use std::io::Write;

        let dir = std::env::temp_dir().join(format!("ovitrap_e2e_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        // 10 solid-color images, labels alternating.
        let mut csv = String::from("file_path,label\n");
        for i in 0..10 {
            let path = dir.join(format!("img{}.png", i));
            let value = if i % 2 == 0 { 220u8 } else { 30u8 };
            let img: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::from_pixel(8, 8, Luma([value]));
            img.save(&path).unwrap();
            csv.push_str(&format!("{},{}\n", path.display(), i % 2));
        }
        let csv_path = dir.join("metadata.csv");
        let mut file = std::fs::File::create(&csv_path).unwrap();
        file.write_all(csv.as_bytes()).unwrap();

        let preprocess = PreprocessConfig::default();
        let records = load_metadata(&csv_path).unwrap();
        let samples = load_samples(&records, &preprocess).unwrap();
        let splits = split(samples, &SplitConfig::default()).unwrap();

        let device = Default::default();
        let artifact = ModelArtifact::at(dir.join("model"));
        let config = TrainConfig {
            epochs: 1,
            batch_size: 4,
            ..Default::default()
        };
        let (_model, history) = train::<TrainingBackend>(
            &splits,
            &EggClassifierConfig::new(),
            &preprocess,
            &config,
            &artifact,
            &device,
        )
        .unwrap();

        assert_eq!(history.records.len(), 1);
        let record = history.last().unwrap();
        assert!(record.train_loss.is_finite());
        assert!(record.train_accuracy.is_finite());
        assert!(record.holdout_loss.is_finite());
        assert!(record.holdout_accuracy.is_finite());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let device = Default::default();
        let splits = synthetic_splits(10, 16);
        let model_config = EggClassifierConfig::new().with_input_size(16);
        let preprocess = PreprocessConfig::with_size(16);
        let config = TrainConfig {
            epochs: 0,
            ..Default::default()
        };
        let artifact = ModelArtifact::at(temp_stem("invalid"));

        let result = train::<TrainingBackend>(
            &splits,
            &model_config,
            &preprocess,
            &config,
            &artifact,
            &device,
        );
        assert!(matches!(result, Err(OvitrapError::Config(_))));
    }
}
