//! `pageguard host`: answer the extension's `analyze` messages over
//! native messaging (stdin/stdout).

use crate::config::GuardConfig;
use crate::host;
use anyhow::{Context, Result};
use pageguard::{AnalysisMode, Analyzer, KeywordFilter};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Build the analyzer the host answers with, applying CLI overrides.
pub fn build_analyzer(
    config: &GuardConfig,
    model: Option<PathBuf>,
    mode: Option<AnalysisMode>,
) -> Analyzer {
    let mode = mode.unwrap_or(config.mode);
    let model_dir = model.or_else(|| config.model_dir.clone());
    Analyzer::build(
        mode,
        KeywordFilter::new(&config.keywords),
        model_dir.as_deref(),
        config.threshold,
    )
}

/// Run the host until the browser closes the pipe.
pub async fn run(
    config: &GuardConfig,
    model: Option<PathBuf>,
    mode: Option<AnalysisMode>,
) -> Result<()> {
    let analyzer = build_analyzer(config, model, mode);
    info!(
        "pageguard host v{} ready (mode: {})",
        env!("CARGO_PKG_VERSION"),
        analyzer.mode()
    );

    let start = Instant::now();
    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let stats = host::serve(&mut stdin, &mut stdout, &analyzer)
        .await
        .context("native messaging session failed")?;

    info!(
        received = stats.received,
        answered = stats.answered,
        harmful = stats.harmful,
        skipped = stats.skipped,
        "host stopped after {:.1}s",
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
