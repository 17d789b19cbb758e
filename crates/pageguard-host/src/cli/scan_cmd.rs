//! `pageguard scan`: analyze a piece of text or a saved page offline.

use crate::cli::host_cmd::build_analyzer;
use crate::cli::output::{self, Styled};
use crate::config::GuardConfig;
use anyhow::{bail, Context, Result};
use clap::Args;
use pageguard::text::page_text;
use pageguard::{AnalysisMode, ContentAnalyzer, Verdict, NEUTRAL_SCORE};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Args)]
pub struct ScanArgs {
    /// Text to analyze
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(long, conflicts_with_all = ["text", "html"])]
    pub file: Option<PathBuf>,

    /// Read an HTML page and analyze its body text
    #[arg(long, conflicts_with = "text")]
    pub html: Option<PathBuf>,

    /// Trained model directory
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// keywords, model, or either
    #[arg(long)]
    pub mode: Option<AnalysisMode>,
}

impl ScanArgs {
    /// The text to analyze, taken from whichever input was given.
    pub fn input(&self) -> Result<String> {
        if let Some(path) = &self.html {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            return Ok(page_text(&html));
        }
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()));
        }
        match &self.text {
            Some(text) => Ok(text.clone()),
            None => bail!("nothing to scan; pass TEXT, --file, or --html"),
        }
    }
}

/// Analyze the input and print the verdict.
pub async fn run(config: &GuardConfig, args: ScanArgs) -> Result<()> {
    let text = args.input()?;
    let analyzer = build_analyzer(config, args.model.clone(), args.mode);
    let verdict = analyzer.analyze(&text);

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "mode": analyzer.mode().to_string(),
            "chars": text.chars().count(),
            "verdict": verdict,
        }));
        return Ok(());
    }

    print_verdict(&Styled::new(), &verdict, analyzer.mode());
    Ok(())
}

fn print_verdict(s: &Styled, verdict: &Verdict, mode: AnalysisMode) {
    if output::is_quiet() {
        println!("{}", if verdict.is_harmful { "harmful" } else { "clean" });
        return;
    }
    let (sym, label) = if verdict.is_harmful {
        (s.fail_sym(), s.red("harmful"))
    } else {
        (s.ok_sym(), s.green("clean"))
    };
    output::print_check(sym, "Verdict:", &label);
    output::print_field("Score:", &output::format_score(verdict.score));
    output::print_field("Mode:", &mode.to_string());
    if mode != AnalysisMode::Keywords && verdict.score == NEUTRAL_SCORE {
        output::print_check(
            s.warn_sym(),
            "Model:",
            &s.yellow("neutral score; check the model directory"),
        );
    }
    if !verdict.matched.is_empty() {
        output::print_field("Matched:", &verdict.matched.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_from_text() {
        let args = ScanArgs {
            text: Some("hello".into()),
            ..ScanArgs::default()
        };
        assert_eq!(args.input().unwrap(), "hello");
    }

    #[test]
    fn test_input_from_html_uses_body_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(
            &path,
            "<html><head><script>var hate = 1;</script></head><body><p>Nice day</p></body></html>",
        )
        .unwrap();
        let args = ScanArgs {
            html: Some(path),
            ..ScanArgs::default()
        };
        let text = args.input().unwrap();
        assert!(text.contains("Nice day"));
        assert!(!text.contains("hate"));
    }

    #[test]
    fn test_missing_input_is_error() {
        assert!(ScanArgs::default().input().is_err());
    }
}
