//! PageGuard core library.
//!
//! Scans page text for harmful content with a keyword filter or a small
//! trained embedding classifier, and provides the pieces needed to train
//! that classifier from labeled CSV corpora:
//!
//! - [`text`]: cleaning, tokenizing, and body-text extraction from HTML
//! - [`vocab`]: first-seen token → index vocabulary (0 = unknown)
//! - [`sequence`]: fixed-length (50) zero-padded sequences
//! - [`keywords`]: case-insensitive keyword filter
//! - [`dataset`]: CSV loading with configurable text/label columns
//! - [`model`]: embedding classifier, training, and model directories
//! - [`pipeline`]: end-to-end training run
//! - [`analyzer`]: verdicts with a neutral fallback score
//! - [`message`]: the extension's `analyze` message and native-messaging framing

pub mod analyzer;
pub mod dataset;
pub mod error;
pub mod keywords;
pub mod message;
pub mod model;
pub mod pipeline;
pub mod sequence;
pub mod text;
pub mod vocab;

pub use analyzer::{
    AnalysisMode, Analyzer, ContentAnalyzer, ModelAnalyzer, NeutralAnalyzer, Verdict,
    DEFAULT_THRESHOLD, NEUTRAL_SCORE,
};
pub use dataset::{DatasetSource, LabeledText};
pub use error::{GuardError, Result};
pub use keywords::KeywordFilter;
pub use message::{Request, Response};
pub use model::{ModelConfig, SavedModel, TextClassifier, TrainConfig};
pub use pipeline::{TrainingPipeline, TrainingReport};
pub use sequence::{pad_sequence, preprocess, MAX_SEQUENCE_LENGTH};
pub use vocab::Vocabulary;
