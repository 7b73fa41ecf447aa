//! Backend abstraction - ndarray CPU backend
//!
//! The whole pipeline runs on the CPU via Burn's ndarray backend so that
//! training and inference behave identically on any machine.

use burn::backend::{Autodiff, NdArray};

/// The default backend for inference and evaluation
pub type DefaultBackend = NdArray;

/// The default autodiff backend for training
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Get the default device (CPU)
pub fn default_device() -> <DefaultBackend as burn::tensor::backend::Backend>::Device {
    Default::default()
}

/// Get a human-readable name for the current backend
pub fn backend_name() -> &'static str {
    "NdArray (CPU)"
}
