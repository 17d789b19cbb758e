//! Configuration file handling.
//!
//! Settings live in `$PAGEGUARD_HOME/config.toml` (default
//! `~/.pageguard/config.toml`). Every field is optional; command-line flags
//! override whatever the file says.

use pageguard::keywords::DEFAULT_KEYWORDS;
use pageguard::{AnalysisMode, DatasetSource, ModelConfig, TrainConfig, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file inside the PageGuard home directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Errors raised while reading the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// PageGuard home directory (`$PAGEGUARD_HOME`, else `~/.pageguard`).
pub fn pageguard_home() -> PathBuf {
    if let Ok(home) = std::env::var("PAGEGUARD_HOME") {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".pageguard")
}

/// All settings the CLI and native host read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// How `analyze` requests are judged.
    pub mode: AnalysisMode,
    /// Model scores strictly above this are harmful.
    pub threshold: f32,
    pub keywords: Vec<String>,
    /// Trained model directory used by `model` and `either` modes.
    pub model_dir: Option<PathBuf>,
    pub model: ModelConfig,
    pub training: TrainConfig,
    pub datasets: Vec<DatasetSource>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::default(),
            threshold: DEFAULT_THRESHOLD,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            model_dir: None,
            model: ModelConfig::default(),
            training: TrainConfig::default(),
            datasets: DatasetSource::defaults(),
        }
    }
}

impl GuardConfig {
    /// Load from `path`, or from the default location when `path` is
    /// `None`. A missing default file yields the defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (pageguard_home().join(CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse { path, source },
            other => other,
        })
    }

    /// Parse TOML text and validate it.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::Invalid(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        self.model
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("[model]: {e}")))?;
        Ok(())
    }
}
