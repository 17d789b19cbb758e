//! Mini-batch training loop with a held-out validation tail.

use super::config::TrainConfig;
use super::network::{batch_loss, TextClassifier};
use super::optimizer::Adam;
use crate::error::{GuardError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A padded sequence and its binary label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub sequence: Vec<u32>,
    pub label: bool,
}

impl Example {
    pub fn new(sequence: Vec<u32>, label: bool) -> Self {
        Self { sequence, label }
    }

    fn target(&self) -> f32 {
        if self.label {
            1.0
        } else {
            0.0
        }
    }
}

/// Metrics recorded at the end of one epoch. `epoch` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f32,
    pub accuracy: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val_loss: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val_accuracy: Option<f32>,
}

/// Per-epoch metrics of a completed `fit`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
    pub train_samples: usize,
    pub validation_samples: usize,
}

impl TrainingHistory {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }
}

/// Receives metrics as each epoch finishes.
pub trait EpochObserver {
    fn on_epoch_end(&mut self, metrics: &EpochMetrics, total_epochs: usize);
}

impl<F: FnMut(&EpochMetrics, usize)> EpochObserver for F {
    fn on_epoch_end(&mut self, metrics: &EpochMetrics, total_epochs: usize) {
        self(metrics, total_epochs)
    }
}

/// Observer that ignores every epoch.
pub struct Silent;

impl EpochObserver for Silent {
    fn on_epoch_end(&mut self, _metrics: &EpochMetrics, _total_epochs: usize) {}
}

impl TextClassifier {
    /// Train on `examples`, holding out the last `validation_split`
    /// fraction (in input order) for validation.
    pub fn fit(
        &mut self,
        examples: &[Example],
        config: &TrainConfig,
        observer: &mut dyn EpochObserver,
    ) -> Result<TrainingHistory> {
        if !(0.0..1.0).contains(&config.validation_split) {
            return Err(GuardError::Training(format!(
                "validation_split must be in [0, 1), got {}",
                config.validation_split
            )));
        }
        if config.batch_size == 0 {
            return Err(GuardError::Training("batch_size must be positive".into()));
        }
        for example in examples {
            self.check_length(&example.sequence)
                .map_err(|e| GuardError::Training(e.to_string()))?;
        }

        let split_at = (examples.len() as f32 * (1.0 - config.validation_split)) as usize;
        let (train, validation) = examples.split_at(split_at.min(examples.len()));
        if train.is_empty() {
            return Err(GuardError::Training(format!(
                "no training samples ({} total, validation_split {})",
                examples.len(),
                config.validation_split
            )));
        }

        info!(
            "training on {} samples, validating on {}",
            train.len(),
            validation.len()
        );

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut adam = Adam::new(self.config(), config.learning_rate);
        let mut order: Vec<usize> = (0..train.len()).collect();
        let mut history = TrainingHistory {
            epochs: Vec::with_capacity(config.epochs),
            train_samples: train.len(),
            validation_samples: validation.len(),
        };

        for epoch in 1..=config.epochs {
            if config.shuffle {
                order.shuffle(&mut rng);
            }

            let mut loss_sum = 0.0f32;
            let mut correct = 0usize;
            for chunk in order.chunks(config.batch_size) {
                let batch: Vec<&[u32]> = chunk
                    .iter()
                    .map(|&i| train[i].sequence.as_slice())
                    .collect();
                let targets: Vec<f32> = chunk.iter().map(|&i| train[i].target()).collect();

                let acts = self.forward(&batch);
                let (loss, batch_correct) = batch_loss(&acts.output, &targets);
                loss_sum += loss * batch.len() as f32;
                correct += batch_correct;

                let grads = self.backward(&batch, &targets, &acts);
                adam.step(&mut self.params, &grads);
            }

            let (val_loss, val_accuracy) = if validation.is_empty() {
                (None, None)
            } else {
                let (l, a) = self.evaluate_with_batch(validation, config.batch_size);
                (Some(l), Some(a))
            };

            let metrics = EpochMetrics {
                epoch,
                loss: loss_sum / train.len() as f32,
                accuracy: correct as f32 / train.len() as f32,
                val_loss,
                val_accuracy,
            };
            info!(
                epoch,
                loss = metrics.loss,
                accuracy = metrics.accuracy,
                val_loss = ?metrics.val_loss,
                val_accuracy = ?metrics.val_accuracy,
                "epoch {epoch}/{} complete",
                config.epochs
            );
            observer.on_epoch_end(&metrics, config.epochs);
            history.epochs.push(metrics);
        }

        Ok(history)
    }

    /// Mean loss and accuracy over `examples`.
    pub fn evaluate(&self, examples: &[Example]) -> Result<(f32, f32)> {
        for example in examples {
            self.check_length(&example.sequence)?;
        }
        if examples.is_empty() {
            return Ok((0.0, 0.0));
        }
        Ok(self.evaluate_with_batch(examples, TrainConfig::default().batch_size))
    }

    fn evaluate_with_batch(&self, examples: &[Example], batch_size: usize) -> (f32, f32) {
        let mut loss_sum = 0.0f32;
        let mut correct = 0usize;
        for chunk in examples.chunks(batch_size.max(1)) {
            let batch: Vec<&[u32]> = chunk.iter().map(|e| e.sequence.as_slice()).collect();
            let targets: Vec<f32> = chunk.iter().map(Example::target).collect();
            let (loss, batch_correct) = batch_loss(&self.forward(&batch).output, &targets);
            loss_sum += loss * chunk.len() as f32;
            correct += batch_correct;
        }
        let n = examples.len() as f32;
        (loss_sum / n, correct as f32 / n)
    }
}
