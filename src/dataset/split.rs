//! Deterministic train/holdout splitting
//!
//! Partitions aligned image/label collections into a training set and a
//! holdout set. Membership is decided by a seeded ChaCha8 shuffle, so the
//! same seed and ratio always reproduce the same split.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::loader::SampleSet;
use crate::utils::error::{OvitrapError, Result};

/// Configuration for dataset splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of samples held out for validation
    pub holdout_fraction: f64,
    /// Random seed for reproducible membership
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            holdout_fraction: 0.2,
            seed: 42,
        }
    }
}

impl SplitConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.holdout_fraction <= 0.0 || self.holdout_fraction >= 1.0 {
            return Err(OvitrapError::Config(format!(
                "holdout_fraction must be in (0.0, 1.0), got {}",
                self.holdout_fraction
            )));
        }
        Ok(())
    }
}

/// The two disjoint, exhaustive partitions produced by [`split`]
#[derive(Debug, Clone)]
pub struct SplitSets {
    /// Samples used for weight updates
    pub train: SampleSet,
    /// Samples used only to measure generalization
    pub holdout: SampleSet,
}

/// Deterministically partition a sample set into train and holdout subsets.
///
/// `ceil(n * holdout_fraction)` samples go to the holdout set. Image/label
/// pairing is preserved. Fails on empty or misaligned input collections.
pub fn split(samples: SampleSet, config: &SplitConfig) -> Result<SplitSets> {
    config.validate()?;

    if samples.is_empty() {
        return Err(OvitrapError::Dataset(
            "cannot split an empty sample set".to_string(),
        ));
    }
    if samples.images.len() != samples.labels.len() {
        return Err(OvitrapError::Dataset(format!(
            "misaligned collections: {} images vs {} labels",
            samples.images.len(),
            samples.labels.len()
        )));
    }

    let n = samples.len();
    let n_holdout = ((n as f64) * config.holdout_fraction).ceil() as usize;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);

    let mut train = SampleSet::new();
    let mut holdout = SampleSet::new();

    for (position, &idx) in indices.iter().enumerate() {
        let target = if position < n_holdout {
            &mut holdout
        } else {
            &mut train
        };
        target.images.push(samples.images[idx].clone());
        target.labels.push(samples.labels[idx]);
    }

    info!(
        "Split {} samples: {} train, {} holdout (seed {})",
        n,
        train.len(),
        holdout.len(),
        config.seed
    );

    Ok(SplitSets { train, holdout })
}
