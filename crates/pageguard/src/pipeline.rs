//! Training pipeline: CSV → clean → vocabulary → pad → fit → save.

use crate::dataset::{self, DatasetSource, LabeledText};
use crate::error::{GuardError, Result};
use crate::model::{
    EpochObserver, Example, ModelConfig, ModelManifest, SavedModel, TextClassifier, TrainConfig,
    TrainingHistory,
};
use crate::sequence::preprocess;
use crate::vocab::Vocabulary;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Summary of a finished training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub samples: usize,
    pub positives: usize,
    pub vocabulary_size: usize,
    pub history: TrainingHistory,
    pub manifest: ModelManifest,
    pub output_dir: PathBuf,
    pub elapsed_ms: u64,
}

/// Runs the full training flow with fixed model and training settings.
pub struct TrainingPipeline {
    model_config: ModelConfig,
    train_config: TrainConfig,
}

impl TrainingPipeline {
    pub fn new(model_config: ModelConfig, train_config: TrainConfig) -> Self {
        Self {
            model_config,
            train_config,
        }
    }

    /// Load every source, train, and save the model into `out_dir`.
    pub fn run(
        &self,
        sources: &[DatasetSource],
        out_dir: &Path,
        observer: &mut dyn EpochObserver,
    ) -> Result<TrainingReport> {
        let start = Instant::now();
        let rows = dataset::load_all(sources)?;
        if rows.is_empty() {
            return Err(GuardError::Training("datasets contain no usable rows".into()));
        }
        self.train_loaded(&rows, out_dir, observer, start)
    }

    /// Train on rows that are already loaded and cleaned.
    pub fn train_rows(
        &self,
        rows: &[LabeledText],
        out_dir: &Path,
        observer: &mut dyn EpochObserver,
    ) -> Result<TrainingReport> {
        self.train_loaded(rows, out_dir, observer, Instant::now())
    }

    fn train_loaded(
        &self,
        rows: &[LabeledText],
        out_dir: &Path,
        observer: &mut dyn EpochObserver,
        start: Instant,
    ) -> Result<TrainingReport> {
        self.model_config.validate()?;
        let vocabulary = Vocabulary::from_texts(rows.iter().map(|r| r.text.as_str()));
        let capacity = self.model_config.input_dim.saturating_sub(1);
        if vocabulary.len() > capacity {
            warn!(
                "vocabulary has {} tokens but the embedding holds {capacity}; \
                 later tokens will be read as unknown",
                vocabulary.len()
            );
        }

        let examples: Vec<Example> = rows
            .iter()
            .map(|row| {
                Example::new(preprocess(&row.text, &vocabulary), row.is_positive())
            })
            .collect();
        let positives = examples.iter().filter(|e| e.label).count();
        info!(
            "{} samples ({positives} positive), {} distinct tokens",
            examples.len(),
            vocabulary.len()
        );

        let mut classifier = TextClassifier::new(self.model_config, self.train_config.seed);
        let history = classifier.fit(&examples, &self.train_config, observer)?;
        let manifest = SavedModel::save(out_dir, &classifier, &vocabulary, Some(&history))?;

        info!("model trained and saved to {}", out_dir.display());

        Ok(TrainingReport {
            samples: examples.len(),
            positives,
            vocabulary_size: vocabulary.len(),
            history,
            manifest,
            output_dir: out_dir.to_path_buf(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}
