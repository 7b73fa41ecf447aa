//! Per-epoch training metrics
//!
//! The trainer records loss and accuracy on both partitions after every
//! epoch. The history can be persisted as JSON next to the model artifact
//! for later inspection.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::{OvitrapError, Result};

/// Metrics for one completed epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochRecord {
    /// 1-based epoch number
    pub epoch: usize,
    /// Mean binary cross-entropy over the training partition
    pub train_loss: f64,
    /// Fraction of correct thresholded predictions on the training partition
    pub train_accuracy: f64,
    /// Mean binary cross-entropy over the holdout partition
    pub holdout_loss: f64,
    /// Fraction of correct thresholded predictions on the holdout partition
    pub holdout_accuracy: f64,
}

/// Chronological record of a training run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// One entry per completed epoch, in training order
    pub records: Vec<EpochRecord>,
}

impl TrainingHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the metrics of a completed epoch
    pub fn push(&mut self, record: EpochRecord) {
        self.records.push(record);
    }

    /// Metrics of the most recent epoch, if any
    pub fn last(&self) -> Option<&EpochRecord> {
        self.records.last()
    }

    /// Epoch with the highest holdout accuracy, if any
    pub fn best_epoch(&self) -> Option<&EpochRecord> {
        self.records.iter().max_by(|a, b| {
            a.holdout_accuracy
                .partial_cmp(&b.holdout_accuracy)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Write the history as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| OvitrapError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a history previously written by [`TrainingHistory::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| OvitrapError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(epoch: usize, holdout_accuracy: f64) -> EpochRecord {
        EpochRecord {
            epoch,
            train_loss: 0.5,
            train_accuracy: 0.8,
            holdout_loss: 0.6,
            holdout_accuracy,
        }
    }

    #[test]
    fn test_best_epoch() {
        let mut history = TrainingHistory::new();
        history.push(record(1, 0.6));
        history.push(record(2, 0.9));
        history.push(record(3, 0.7));

        assert_eq!(history.best_epoch().unwrap().epoch, 2);
        assert_eq!(history.last().unwrap().epoch, 3);
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut history = TrainingHistory::new();
        history.push(record(1, 0.5));

        let path = std::env::temp_dir().join(format!(
            "ovitrap_history_{}_roundtrip.json",
            std::process::id()
        ));
        history.save(&path).unwrap();

        let loaded = TrainingHistory::load(&path).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].epoch, 1);

        std::fs::remove_file(path).ok();
    }
}
