//! Error types shared across the PageGuard library.

use std::path::PathBuf;

/// Errors produced by dataset loading, vocabulary handling, and the classifier.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("column '{column}' not found in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("invalid dataset source '{0}': expected PATH:TEXT_COLUMN:LABEL_COLUMN")]
    InvalidDatasetSource(String),

    #[error("invalid vocabulary: {0}")]
    InvalidVocabulary(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("training failed: {0}")]
    Training(String),

    #[error("message too large: {size} bytes (limit {limit})")]
    MessageTooLarge { size: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, GuardError>;
