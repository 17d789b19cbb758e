//! Token vocabulary: maps cleaned tokens to embedding indices.
//!
//! Indices are handed out greedily in first-seen order starting at 1.
//! Index 0 is reserved for tokens the vocabulary has never seen, which is
//! also the value used for sequence padding.

use crate::dataset;
use crate::error::{GuardError, Result};
use crate::text::{clean_text, tokenize};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Index assigned to tokens missing from the vocabulary.
pub const UNKNOWN_INDEX: u32 = 0;

/// A token → index mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    index: HashMap<String, u32>,
    /// Tokens in index order; `tokens[i]` has index `i + 1`.
    tokens: Vec<String>,
}

/// On-disk representation: the token list in index order.
#[derive(Serialize, Deserialize)]
struct VocabularyFile {
    tokens: Vec<String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vocabulary from raw texts; each text is cleaned and tokenized.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = Self::new();
        for text in texts {
            vocab.extend_from_text(text.as_ref());
        }
        vocab
    }

    /// Build a vocabulary from the text column of several CSV files.
    ///
    /// `column_indices[i]` is the zero-based column holding text in
    /// `paths[i]`. Sources that cannot be read contribute nothing.
    pub fn from_sources<P: AsRef<Path>>(paths: &[P], column_indices: &[usize]) -> Self {
        if paths.len() != column_indices.len() {
            warn!(
                "{} sources but {} column indices; extra entries ignored",
                paths.len(),
                column_indices.len()
            );
        }

        let mut vocab = Self::new();
        for (path, &column) in paths.iter().zip(column_indices) {
            let texts = dataset::load_text_column(path.as_ref(), column);
            let before = vocab.len();
            for text in &texts {
                vocab.extend_from_text(text);
            }
            info!(
                "{}: {} texts, {} new tokens",
                path.as_ref().display(),
                texts.len(),
                vocab.len() - before
            );
        }
        vocab
    }

    /// Clean and tokenize `text`, inserting every token.
    pub fn extend_from_text(&mut self, text: &str) {
        for token in tokenize(&clean_text(text)) {
            self.insert(&token);
        }
    }

    /// Insert a token, returning its index. Known tokens keep their index;
    /// empty tokens are never stored and map to [`UNKNOWN_INDEX`].
    pub fn insert(&mut self, token: &str) -> u32 {
        if token.is_empty() {
            return UNKNOWN_INDEX;
        }
        if let Some(&idx) = self.index.get(token) {
            return idx;
        }
        self.tokens.push(token.to_string());
        let idx = self.tokens.len() as u32;
        self.index.insert(token.to_string(), idx);
        idx
    }

    /// Index of a token, or [`UNKNOWN_INDEX`] when absent.
    pub fn index_of(&self, token: &str) -> u32 {
        self.index.get(token).copied().unwrap_or(UNKNOWN_INDEX)
    }

    /// Token stored at `index`, if any.
    pub fn token(&self, index: u32) -> Option<&str> {
        let pos = (index as usize).checked_sub(1)?;
        self.tokens.get(pos).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `(token, index)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i as u32 + 1))
    }

    /// Clean, tokenize, and look up every token of `text`.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        tokenize(&clean_text(text))
            .iter()
            .map(|t| self.index_of(t))
            .collect()
    }

    /// Write the vocabulary as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = VocabularyFile {
            tokens: self.tokens.clone(),
        };
        let json = serde_json::to_string(&file)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a vocabulary written by [`Vocabulary::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let file: VocabularyFile = serde_json::from_str(&data)?;

        let mut vocab = Self::new();
        for token in &file.tokens {
            if token.is_empty() {
                return Err(GuardError::InvalidVocabulary(format!(
                    "empty token at index {}",
                    vocab.len() + 1
                )));
            }
            if vocab.index.contains_key(token) {
                return Err(GuardError::InvalidVocabulary(format!(
                    "duplicate token '{token}'"
                )));
            }
            vocab.insert(token);
        }
        Ok(vocab)
    }
}
