//! Content analysis: turn page text into a harmful / not-harmful verdict.

use crate::error::Result;
use crate::keywords::KeywordFilter;
use crate::model::{SavedModel, TextClassifier};
use crate::sequence::preprocess;
use crate::vocab::Vocabulary;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, error};

/// Score reported when the model cannot produce one.
pub const NEUTRAL_SCORE: f32 = 0.5;

/// Default decision threshold; scores strictly above it are harmful.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Outcome of analyzing one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Probability-like score in `[0, 1]`.
    pub score: f32,
    pub is_harmful: bool,
    /// Keywords that matched, if a keyword filter ran.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched: Vec<String>,
}

impl Verdict {
    pub fn neutral() -> Self {
        Self {
            score: NEUTRAL_SCORE,
            is_harmful: false,
            matched: Vec::new(),
        }
    }
}

/// Anything that can judge a piece of text.
pub trait ContentAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Verdict;
}

impl ContentAnalyzer for KeywordFilter {
    fn analyze(&self, text: &str) -> Verdict {
        let matched: Vec<String> = self.matches(text).into_iter().map(String::from).collect();
        let is_harmful = !matched.is_empty();
        Verdict {
            score: if is_harmful { 1.0 } else { 0.0 },
            is_harmful,
            matched,
        }
    }
}

/// Scores text with a trained [`TextClassifier`].
#[derive(Debug, Clone)]
pub struct ModelAnalyzer {
    classifier: TextClassifier,
    vocabulary: Vocabulary,
    threshold: f32,
}

impl ModelAnalyzer {
    pub fn new(classifier: TextClassifier, vocabulary: Vocabulary, threshold: f32) -> Self {
        Self {
            classifier,
            vocabulary,
            threshold,
        }
    }

    /// Load a model directory written by the training pipeline.
    pub fn load(dir: &Path, threshold: f32) -> Result<Self> {
        let saved = SavedModel::load(dir)?;
        Ok(Self::new(saved.classifier, saved.vocabulary, threshold))
    }

    /// Raw model probability for `text`.
    pub fn predict(&self, text: &str) -> Result<f32> {
        self.classifier.config().validate()?;
        self.classifier.predict(&preprocess(text, &self.vocabulary))
    }

    /// Model probability, or [`NEUTRAL_SCORE`] when prediction fails.
    pub fn score(&self, text: &str) -> f32 {
        match self.predict(text) {
            Ok(p) if p.is_finite() => p,
            Ok(p) => {
                error!("model produced a non-finite score ({p}); using neutral score");
                NEUTRAL_SCORE
            }
            Err(e) => {
                error!("error during text analysis: {e}");
                NEUTRAL_SCORE
            }
        }
    }
}

impl ContentAnalyzer for ModelAnalyzer {
    fn analyze(&self, text: &str) -> Verdict {
        let score = self.score(text);
        Verdict {
            score,
            is_harmful: score > self.threshold,
            matched: Vec::new(),
        }
    }
}

/// Stand-in used when a model was requested but could not be loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralAnalyzer;

impl ContentAnalyzer for NeutralAnalyzer {
    fn analyze(&self, _text: &str) -> Verdict {
        Verdict::neutral()
    }
}

/// Which signals decide a verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Keyword filter only.
    #[default]
    Keywords,
    /// Trained model only.
    Model,
    /// Harmful when either the keywords or the model flag it.
    Either,
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keywords" | "keyword" => Ok(Self::Keywords),
            "model" => Ok(Self::Model),
            "either" | "combined" => Ok(Self::Either),
            other => Err(format!(
                "unknown analysis mode '{other}' (expected keywords, model, or either)"
            )),
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Keywords => "keywords",
            Self::Model => "model",
            Self::Either => "either",
        };
        f.write_str(name)
    }
}

/// The analyzer the host answers `analyze` messages with.
pub struct Analyzer {
    mode: AnalysisMode,
    keywords: KeywordFilter,
    model: Option<Box<dyn ContentAnalyzer>>,
}

impl Analyzer {
    /// Build an analyzer for `mode`. A model that fails to load is logged
    /// and replaced by [`NeutralAnalyzer`].
    pub fn build(
        mode: AnalysisMode,
        keywords: KeywordFilter,
        model_dir: Option<&Path>,
        threshold: f32,
    ) -> Self {
        let model: Option<Box<dyn ContentAnalyzer>> = match (mode, model_dir) {
            (AnalysisMode::Keywords, _) => None,
            (_, Some(dir)) => match ModelAnalyzer::load(dir, threshold) {
                Ok(m) => Some(Box::new(m)),
                Err(e) => {
                    error!("failed to load model from {}: {e}", dir.display());
                    Some(Box::new(NeutralAnalyzer))
                }
            },
            (_, None) => {
                error!("analysis mode '{mode}' needs a model directory; using neutral score");
                Some(Box::new(NeutralAnalyzer))
            }
        };
        Self {
            mode,
            keywords,
            model,
        }
    }

    /// Keyword-only analyzer.
    pub fn keywords(keywords: KeywordFilter) -> Self {
        Self {
            mode: AnalysisMode::Keywords,
            keywords,
            model: None,
        }
    }

    /// Analyzer backed by an already-constructed model analyzer.
    pub fn with_model(
        mode: AnalysisMode,
        keywords: KeywordFilter,
        model: Box<dyn ContentAnalyzer>,
    ) -> Self {
        Self {
            mode,
            keywords,
            model: Some(model),
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }
}

impl ContentAnalyzer for Analyzer {
    fn analyze(&self, text: &str) -> Verdict {
        let verdict = match (self.mode, &self.model) {
            (AnalysisMode::Keywords, _) | (_, None) => self.keywords.analyze(text),
            (AnalysisMode::Model, Some(model)) => model.analyze(text),
            (AnalysisMode::Either, Some(model)) => {
                let by_keyword = self.keywords.analyze(text);
                let by_model = model.analyze(text);
                Verdict {
                    score: by_model.score.max(by_keyword.score),
                    is_harmful: by_keyword.is_harmful || by_model.is_harmful,
                    matched: by_keyword.matched,
                }
            }
        };
        debug!(
            mode = %self.mode,
            score = verdict.score,
            harmful = verdict.is_harmful,
            chars = text.len(),
            "analyzed text"
        );
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelConfig;

    struct Fixed(f32);

    impl ContentAnalyzer for Fixed {
        fn analyze(&self, _text: &str) -> Verdict {
            Verdict {
                score: self.0,
                is_harmful: self.0 > DEFAULT_THRESHOLD,
                matched: Vec::new(),
            }
        }
    }

    #[test]
    fn test_keyword_verdict() {
        let v = KeywordFilter::default().analyze("So BAD");
        assert!(v.is_harmful);
        assert_eq!(v.score, 1.0);
        assert_eq!(v.matched, vec!["bad"]);

        let v = KeywordFilter::default().analyze("lovely");
        assert!(!v.is_harmful);
        assert_eq!(v.score, 0.0);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Model".parse::<AnalysisMode>().unwrap(), AnalysisMode::Model);
        assert_eq!("combined".parse::<AnalysisMode>().unwrap(), AnalysisMode::Either);
        assert!("magic".parse::<AnalysisMode>().is_err());
        assert_eq!(AnalysisMode::Either.to_string(), "either");
    }

    #[test]
    fn test_missing_model_gives_neutral_score() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = Analyzer::build(
            AnalysisMode::Model,
            KeywordFilter::default(),
            Some(&dir.path().join("missing")),
            DEFAULT_THRESHOLD,
        );
        let v = analyzer.analyze("attack");
        assert_eq!(v.score, NEUTRAL_SCORE);
        assert!(!v.is_harmful);
    }

    #[test]
    fn test_unusable_model_gives_neutral_score() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig {
            input_dim: 8,
            output_dim: 2,
            input_length: 50,
            hidden_units: 2,
        };
        let vocab = Vocabulary::from_texts(["a b"]);
        SavedModel::save(dir.path(), &TextClassifier::new(config, 1), &vocab, None).unwrap();

        let manifest_path = dir.path().join(crate::model::store::MANIFEST_FILE);
        let text = std::fs::read_to_string(&manifest_path)
            .unwrap()
            .replace("\"input_dim\": 8", "\"input_dim\": 0");
        std::fs::write(&manifest_path, text).unwrap();

        let analyzer = Analyzer::build(
            AnalysisMode::Model,
            KeywordFilter::default(),
            Some(dir.path()),
            DEFAULT_THRESHOLD,
        );
        let v = analyzer.analyze("a");
        assert_eq!(v.score, NEUTRAL_SCORE);
        assert!(!v.is_harmful);
    }

    #[test]
    fn test_model_built_in_memory_with_bad_shape_is_neutral() {
        let config = ModelConfig {
            input_dim: 8,
            output_dim: 2,
            input_length: 7,
            hidden_units: 2,
        };
        let analyzer = ModelAnalyzer::new(
            TextClassifier::new(config, 1),
            Vocabulary::from_texts(["a"]),
            DEFAULT_THRESHOLD,
        );
        assert_eq!(analyzer.score("a"), NEUTRAL_SCORE);
    }

    #[test]
    fn test_either_mode_combines() {
        let analyzer = Analyzer::with_model(
            AnalysisMode::Either,
            KeywordFilter::default(),
            Box::new(Fixed(0.2)),
        );
        assert!(analyzer.analyze("hate speech").is_harmful);
        assert!(!analyzer.analyze("kind words").is_harmful);

        let analyzer = Analyzer::with_model(
            AnalysisMode::Either,
            KeywordFilter::default(),
            Box::new(Fixed(0.9)),
        );
        let v = analyzer.analyze("kind words");
        assert!(v.is_harmful);
        assert_eq!(v.score, 0.9);
    }

    #[test]
    fn test_keywords_mode_ignores_model() {
        let analyzer = Analyzer::with_model(
            AnalysisMode::Keywords,
            KeywordFilter::default(),
            Box::new(Fixed(0.99)),
        );
        assert!(!analyzer.analyze("kind words").is_harmful);
    }

    #[test]
    fn test_model_analyzer_scores_in_range() {
        let config = ModelConfig {
            input_dim: 32,
            output_dim: 4,
            input_length: 50,
            hidden_units: 4,
        };
        let vocab = Vocabulary::from_texts(["some tokens here"]);
        let analyzer = ModelAnalyzer::new(TextClassifier::new(config, 3), vocab, 0.5);
        let score = analyzer.score("some unknown tokens");
        assert!(score > 0.0 && score < 1.0);
        assert_eq!(analyzer.analyze("x").is_harmful, analyzer.score("x") > 0.5);
    }
}
