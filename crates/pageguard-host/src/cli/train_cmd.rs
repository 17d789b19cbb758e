//! `pageguard train`: train the classifier from labeled CSV files.

use crate::cli::output::{self, Styled};
use crate::config::GuardConfig;
use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use pageguard::model::EpochMetrics;
use pageguard::{DatasetSource, TrainConfig, TrainingPipeline, TrainingReport};
use std::path::PathBuf;

/// Flags for `pageguard train`; unset values come from the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct TrainArgs {
    /// Labeled CSV as PATH:TEXT_COLUMN:LABEL_COLUMN (repeatable)
    #[arg(long = "dataset", value_name = "PATH:TEXT:LABEL")]
    pub datasets: Vec<DatasetSource>,

    /// Output model directory
    #[arg(long, default_value = "./model")]
    pub out: PathBuf,

    #[arg(long)]
    pub epochs: Option<usize>,

    /// Fraction of samples held out for validation
    #[arg(long)]
    pub validation_split: Option<f32>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub learning_rate: Option<f32>,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl TrainArgs {
    /// Training settings: config file values with CLI overrides applied.
    pub fn train_config(&self, base: &TrainConfig) -> TrainConfig {
        let mut config = base.clone();
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(split) = self.validation_split {
            config.validation_split = split;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(lr) = self.learning_rate {
            config.learning_rate = lr;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }

    /// Datasets from the command line, else from the config file.
    pub fn sources(&self, config: &GuardConfig) -> Vec<DatasetSource> {
        if self.datasets.is_empty() {
            config.datasets.clone()
        } else {
            self.datasets.clone()
        }
    }
}

fn progress_bar(epochs: usize) -> ProgressBar {
    if output::is_quiet() || output::is_json() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(epochs as u64);
    if let Ok(style) =
        ProgressStyle::with_template("  {spinner:.cyan} epoch {pos}/{len} [{bar:30.cyan/dim}] {msg}")
    {
        bar.set_style(style.progress_chars("\u{2588}\u{2591} "));
    }
    bar
}

fn epoch_message(m: &EpochMetrics) -> String {
    let mut msg = format!("loss {:.4}  acc {:.3}", m.loss, m.accuracy);
    if let (Some(vl), Some(va)) = (m.val_loss, m.val_accuracy) {
        msg.push_str(&format!("  val_loss {vl:.4}  val_acc {va:.3}"));
    }
    msg
}

/// Run the training pipeline and report the result.
pub async fn run(config: &GuardConfig, args: TrainArgs) -> Result<()> {
    let sources = args.sources(config);
    if sources.is_empty() {
        bail!("no datasets given; pass --dataset PATH:TEXT:LABEL or configure [[datasets]]");
    }
    let train_config = args.train_config(&config.training);
    let model_config = config.model;
    let out = args.out.clone();

    if !output::is_quiet() && !output::is_json() {
        let s = Styled::new();
        output::print_header(&s);
        output::print_section(&s, "Training");
        for source in &sources {
            output::print_field(
                "Dataset:",
                &format!(
                    "{} ({} / {})",
                    source.path.display(),
                    source.text_column,
                    source.label_column
                ),
            );
        }
        output::print_field("Epochs:", &train_config.epochs.to_string());
        output::print_field("Output:", &out.display().to_string());
        eprintln!();
    }

    let bar = progress_bar(train_config.epochs);
    let worker_bar = bar.clone();
    let report = tokio::task::spawn_blocking(move || {
        let mut observer = |m: &EpochMetrics, _total: usize| {
            worker_bar.set_message(epoch_message(m));
            worker_bar.inc(1);
        };
        TrainingPipeline::new(model_config, train_config).run(&sources, &out, &mut observer)
    })
    .await
    .context("training task panicked")?;

    let report = match report {
        Ok(r) => {
            bar.finish();
            r
        }
        Err(e) => {
            bar.abandon();
            return Err(e).context("training failed");
        }
    };

    print_report(&report);
    Ok(())
}

fn print_report(report: &TrainingReport) {
    if output::is_json() {
        output::print_json(&serde_json::json!({
            "output_dir": report.output_dir.display().to_string(),
            "samples": report.samples,
            "positives": report.positives,
            "vocabulary_size": report.vocabulary_size,
            "history": report.history,
            "duration_ms": report.elapsed_ms,
        }));
        return;
    }
    if output::is_quiet() {
        return;
    }

    let s = Styled::new();
    eprintln!();
    eprintln!(
        "  {} Model trained and saved to {} in {}",
        s.ok_sym(),
        report.output_dir.display(),
        output::format_duration_ms(report.elapsed_ms)
    );
    output::print_field(
        "Samples:",
        &format!("{} ({} harmful)", report.samples, report.positives),
    );
    output::print_field("Vocabulary:", &format!("{} tokens", report.vocabulary_size));
    if let Some(last) = report.history.last() {
        output::print_field("Final:", &epoch_message(last));
    }
}
