//! Training module
//!
//! Supervised training of the egg classifier plus the per-epoch metric
//! history it produces.

pub mod history;
pub mod trainer;

pub use history::{EpochRecord, TrainingHistory};
pub use trainer::{train, TrainConfig};
