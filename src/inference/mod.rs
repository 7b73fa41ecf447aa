//! Inference module
//!
//! Loads a persisted model artifact and classifies new ovitrap images with
//! the exact preprocessing the model was trained with.

pub mod predictor;

pub use predictor::{Detection, Predictor};
