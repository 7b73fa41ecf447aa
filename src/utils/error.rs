//! Error Handling Module
//!
//! Defines custom error types for the ovitrap screening library.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for ovitrap screening operations
#[derive(Error, Debug)]
pub enum OvitrapError {
    /// The metadata table is unreadable or malformed
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Error decoding or processing an image
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Error with dataset operations (alignment, empty collections)
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error during training
    #[error("Training error: {0}")]
    Training(String),

    /// The persisted model artifact is missing or unreadable
    #[error("Artifact error at '{0}': {1}")]
    Artifact(PathBuf, String),

    /// Error during inference
    #[error("Inference error: {0}")]
    Inference(String),

    /// Input tensor shape does not match what the loaded model expects
    #[error("Input shape mismatch: expected {expected} values ({height}x{width}x{channels}), got {actual}")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
        height: usize,
        width: usize,
        channels: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience Result type for ovitrap screening operations
pub type Result<T> = std::result::Result<T, OvitrapError>;
