//! Embedding classifier: a three-layer network over padded token sequences.
//!
//! The architecture is fixed: an embedding table, global average pooling
//! over the sequence, a ReLU dense layer, and a single sigmoid unit. It is
//! trained with binary cross-entropy and Adam, and saved as a directory
//! holding a JSON manifest, raw weights, and the vocabulary.

pub mod config;
pub mod network;
mod optimizer;
pub mod store;
pub mod train;

pub use config::{ModelConfig, TrainConfig};
pub use network::TextClassifier;
pub use store::{ModelManifest, SavedModel, WeightSpec};
pub use train::{EpochMetrics, EpochObserver, Example, Silent, TrainingHistory};
