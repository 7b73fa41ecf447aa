//! Model module: CNN architecture and artifact persistence
//!
//! The network itself lives in [`cnn`]; [`artifact`] handles saving and
//! loading the trained model together with the preprocessing parameters it
//! was trained with.

pub mod artifact;
pub mod cnn;

pub use artifact::{ArtifactManifest, ModelArtifact};
pub use cnn::{EggClassifier, EggClassifierConfig};
