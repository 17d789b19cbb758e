//! `pageguard inspect`: summarize a trained model directory.

use crate::cli::output::{self, Styled};
use anyhow::{Context, Result};
use pageguard::model::store::VOCAB_FILE;
use pageguard::model::ModelManifest;
use pageguard::{SavedModel, Vocabulary};
use std::path::Path;

/// Number of scalar parameters listed in the manifest.
pub fn parameter_count(manifest: &ModelManifest) -> usize {
    manifest
        .weights
        .iter()
        .filter_map(|w| w.element_count())
        .sum()
}

/// Tokens stored at indices `1..=limit`, for a quick look at the vocabulary.
pub fn leading_tokens(vocab: &Vocabulary, limit: usize) -> Vec<&str> {
    (1..=limit as u32).map_while(|i| vocab.token(i)).collect()
}

/// Print the manifest summary for `dir`.
pub async fn run(dir: &Path) -> Result<()> {
    let manifest = SavedModel::read_manifest(dir)
        .with_context(|| format!("reading model at {}", dir.display()))?;

    if output::is_json() {
        let mut value = serde_json::to_value(&manifest)?;
        value["parameters"] = serde_json::json!(parameter_count(&manifest));
        output::print_json(&value);
        return Ok(());
    }

    let s = Styled::new();
    output::print_header(&s);
    output::print_section(&s, "Model");
    output::print_field("Directory:", &dir.display().to_string());
    output::print_field(
        "Format:",
        &format!("{} v{}", manifest.format, manifest.version),
    );
    output::print_field(
        "Trained:",
        &manifest.trained_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    output::print_field("Vocabulary:", &format!("{} tokens", manifest.vocabulary_size));
    output::print_field("Parameters:", &parameter_count(&manifest).to_string());
    let c = &manifest.config;
    output::print_field(
        "Layers:",
        &format!(
            "embedding {}x{} / pool {} / dense {} / sigmoid",
            c.input_dim, c.output_dim, c.input_length, c.hidden_units
        ),
    );

    if output::is_verbose() {
        eprintln!();
        output::print_section(&s, "Weights");
        for w in &manifest.weights {
            output::print_field(&w.name, &format!("{:?}", w.shape));
        }
        match Vocabulary::load(&dir.join(VOCAB_FILE)) {
            Ok(vocab) => {
                output::print_field("First tokens:", &leading_tokens(&vocab, 10).join(" "));
            }
            Err(e) => {
                output::print_check(s.warn_sym(), "Vocabulary:", &s.yellow(&e.to_string()));
            }
        }
    }

    if let Some(history) = &manifest.history {
        eprintln!();
        output::print_section(&s, "Training");
        output::print_field(
            "Samples:",
            &format!(
                "{} train / {} validation",
                history.train_samples, history.validation_samples
            ),
        );
        if let Some(last) = history.last() {
            output::print_field("Epochs:", &last.epoch.to_string());
            output::print_field(
                "Accuracy:",
                &format!("{} (loss {:.4})", output::format_score(last.accuracy), last.loss),
            );
            if let Some(va) = last.val_accuracy {
                output::print_field("Val accuracy:", &output::format_score(va));
            }
        }
    }
    Ok(())
}
