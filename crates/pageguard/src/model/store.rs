//! Model directory: `model.json` manifest, `weights.bin`, `vocab.json`.
//!
//! `weights.bin` holds every tensor as little-endian `f32`, concatenated in
//! manifest order. The manifest carries the shapes so a reader can check
//! the file before trusting it.

use super::config::ModelConfig;
use super::network::{Parameters, TextClassifier};
use super::train::TrainingHistory;
use crate::error::{GuardError, Result};
use crate::vocab::Vocabulary;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

pub const MANIFEST_FILE: &str = "model.json";
pub const WEIGHTS_FILE: &str = "weights.bin";
pub const VOCAB_FILE: &str = "vocab.json";

/// Format tag written into every manifest.
pub const MODEL_FORMAT: &str = "pageguard-layers-model";
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Name and shape of one stored tensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightSpec {
    pub name: String,
    pub shape: Vec<usize>,
}

impl WeightSpec {
    /// Number of scalars in the tensor, or `None` if it overflows `usize`.
    pub fn element_count(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }
}

/// Contents of `model.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub format: String,
    pub version: u32,
    pub config: ModelConfig,
    pub weights: Vec<WeightSpec>,
    pub vocabulary_size: usize,
    pub trained_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<TrainingHistory>,
}

/// A classifier together with the vocabulary it was trained on.
#[derive(Debug, Clone)]
pub struct SavedModel {
    pub classifier: TextClassifier,
    pub vocabulary: Vocabulary,
    pub manifest: ModelManifest,
}

impl SavedModel {
    /// Write `classifier` and `vocabulary` into `dir`, creating it if needed.
    pub fn save(
        dir: &Path,
        classifier: &TextClassifier,
        vocabulary: &Vocabulary,
        history: Option<&TrainingHistory>,
    ) -> Result<ModelManifest> {
        std::fs::create_dir_all(dir)?;
        let config = *classifier.config();

        let manifest = ModelManifest {
            format: MODEL_FORMAT.to_string(),
            version: MODEL_FORMAT_VERSION,
            config,
            weights: Parameters::shapes(&config)
                .into_iter()
                .map(|(name, shape)| WeightSpec {
                    name: name.to_string(),
                    shape,
                })
                .collect(),
            vocabulary_size: vocabulary.len(),
            trained_at: Utc::now(),
            history: history.cloned(),
        };

        let mut writer = BufWriter::new(File::create(dir.join(WEIGHTS_FILE))?);
        for tensor in classifier.params.tensors() {
            for &value in tensor {
                writer.write_f32::<LittleEndian>(value)?;
            }
        }
        writer.flush()?;

        std::fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )?;
        vocabulary.save(&dir.join(VOCAB_FILE))?;

        info!(
            "saved model ({} parameters, {} tokens) to {}",
            classifier.parameter_count(),
            vocabulary.len(),
            dir.display()
        );
        Ok(manifest)
    }

    /// Read only the manifest of a model directory.
    pub fn read_manifest(dir: &Path) -> Result<ModelManifest> {
        let data = std::fs::read_to_string(dir.join(MANIFEST_FILE))?;
        let manifest: ModelManifest = serde_json::from_str(&data)?;

        if manifest.format != MODEL_FORMAT {
            return Err(GuardError::InvalidModel(format!(
                "unknown format '{}'",
                manifest.format
            )));
        }
        if manifest.version != MODEL_FORMAT_VERSION {
            return Err(GuardError::InvalidModel(format!(
                "unsupported version {}",
                manifest.version
            )));
        }
        manifest.config.validate()?;
        let expected: Vec<Vec<usize>> = Parameters::shapes(&manifest.config)
            .into_iter()
            .map(|(_, shape)| shape)
            .collect();
        let found: Vec<Vec<usize>> = manifest.weights.iter().map(|w| w.shape.clone()).collect();
        if expected != found {
            return Err(GuardError::InvalidModel(format!(
                "weight shapes {found:?} do not match config (expected {expected:?})"
            )));
        }
        Ok(manifest)
    }

    /// Load a model directory written by [`SavedModel::save`].
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest = Self::read_manifest(dir)?;

        let weights_path = dir.join(WEIGHTS_FILE);
        let counts = manifest
            .weights
            .iter()
            .map(|w| {
                w.element_count().ok_or_else(|| {
                    GuardError::InvalidModel(format!("tensor {} is too large", w.name))
                })
            })
            .collect::<Result<Vec<usize>>>()?;
        let expected_bytes: u64 = counts.iter().map(|&n| n as u64 * 4).sum();
        let actual_bytes = std::fs::metadata(&weights_path)?.len();
        if actual_bytes != expected_bytes {
            return Err(GuardError::InvalidModel(format!(
                "{} is {actual_bytes} bytes, expected {expected_bytes}",
                weights_path.display()
            )));
        }

        let mut reader = BufReader::new(File::open(&weights_path)?);
        let mut tensors = Vec::with_capacity(manifest.weights.len());
        for &count in &counts {
            let mut values = vec![0.0f32; count];
            reader.read_f32_into::<LittleEndian>(&mut values)?;
            tensors.push(values);
        }
        let params = Parameters::from_tensors(&manifest.config, tensors)?;
        let classifier = TextClassifier::from_parameters(manifest.config, params);

        let vocabulary = Vocabulary::load(&dir.join(VOCAB_FILE))?;
        if vocabulary.len() != manifest.vocabulary_size {
            return Err(GuardError::InvalidModel(format!(
                "vocabulary has {} tokens, manifest says {}",
                vocabulary.len(),
                manifest.vocabulary_size
            )));
        }

        Ok(Self {
            classifier,
            vocabulary,
            manifest,
        })
    }
}
