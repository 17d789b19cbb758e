//! Model and training hyperparameters.

use crate::error::{GuardError, Result};
use crate::sequence::MAX_SEQUENCE_LENGTH;
use serde::{Deserialize, Serialize};

/// Shape of the embedding classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Embedding rows; token indices at or above this are read as unknown.
    pub input_dim: usize,
    /// Embedding width.
    pub output_dim: usize,
    /// Tokens per input sequence; always [`MAX_SEQUENCE_LENGTH`].
    pub input_length: usize,
    /// Width of the ReLU layer.
    pub hidden_units: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_dim: 10_000,
            output_dim: 16,
            input_length: MAX_SEQUENCE_LENGTH,
            hidden_units: 16,
        }
    }
}

impl ModelConfig {
    /// Reject shapes the network cannot run with.
    ///
    /// Index 0 is the unknown token, so the embedding needs at least two
    /// rows. Sequences are always [`MAX_SEQUENCE_LENGTH`] tokens long.
    pub fn validate(&self) -> Result<()> {
        if self.input_length != MAX_SEQUENCE_LENGTH {
            return Err(GuardError::InvalidModel(format!(
                "input_length must be {MAX_SEQUENCE_LENGTH}, got {}",
                self.input_length
            )));
        }
        if self.input_dim < 2 {
            return Err(GuardError::InvalidModel(format!(
                "input_dim must be at least 2, got {}",
                self.input_dim
            )));
        }
        if self.output_dim == 0 || self.hidden_units == 0 {
            return Err(GuardError::InvalidModel(format!(
                "output_dim and hidden_units must be positive, got {} and {}",
                self.output_dim, self.hidden_units
            )));
        }
        let too_large = self
            .input_dim
            .checked_mul(self.output_dim)
            .and(self.output_dim.checked_mul(self.hidden_units))
            .is_none();
        if too_large {
            return Err(GuardError::InvalidModel(format!(
                "model of {}x{}x{} does not fit in memory",
                self.input_dim, self.output_dim, self.hidden_units
            )));
        }
        Ok(())
    }
}

/// Settings for [`TextClassifier::fit`](super::TextClassifier::fit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    /// Fraction of samples, taken from the end, held out for validation.
    pub validation_split: f32,
    pub batch_size: usize,
    pub learning_rate: f32,
    /// Seeds weight initialization and per-epoch shuffling.
    pub seed: u64,
    pub shuffle: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            validation_split: 0.2,
            batch_size: 32,
            learning_rate: 0.001,
            seed: 42,
            shuffle: true,
        }
    }
}
