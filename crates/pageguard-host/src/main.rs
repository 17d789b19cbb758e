//! PageGuard CLI
//!
//! # Commands
//!
//! - `host`: native-messaging host for the browser extension
//! - `train`: train the classifier from labeled CSV files
//! - `vocab`: build a vocabulary from CSV text columns
//! - `scan`: analyze text or a saved page
//! - `inspect`: summarize a trained model directory
//! - `manifest`: print the browser's native-messaging host manifest
//!
//! A browser launching the binary as a native-messaging host runs `host`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pageguard::AnalysisMode;
use pageguard_host::cli::scan_cmd::ScanArgs;
use pageguard_host::cli::train_cmd::TrainArgs;
use pageguard_host::cli::vocab_cmd::ColumnSource;
use pageguard_host::cli::{
    host_cmd, inspect_cmd, launch, manifest_cmd, scan_cmd, train_cmd, vocab_cmd,
};
use pageguard_host::config::GuardConfig;
use pageguard_host::logging::{self, LogFormat};
use std::io::IsTerminal;
use std::path::PathBuf;

/// PageGuard: harmful content scanning for web pages
#[derive(Parser)]
#[command(name = "pageguard", version, about, propagate_version = true)]
struct Cli {
    /// Machine-readable JSON output on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Only print results and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Debug logging and extra detail
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Config file (default: $PAGEGUARD_HOME/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer the extension's analyze messages on stdin/stdout
    Host {
        /// Trained model directory
        #[arg(long)]
        model: Option<PathBuf>,
        /// keywords, model, or either
        #[arg(long)]
        mode: Option<AnalysisMode>,
    },
    /// Train the classifier and save a model directory
    Train(TrainArgs),
    /// Build a vocabulary from CSV text columns
    Vocab {
        /// CSV file and zero-based text column as PATH:COLUMN_INDEX
        #[arg(long = "source", value_name = "PATH:COLUMN_INDEX", required = true)]
        sources: Vec<ColumnSource>,
        /// Write the vocabulary JSON here instead of printing it
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Analyze text or an HTML page
    Scan(ScanArgs),
    /// Summarize a trained model directory
    Inspect {
        /// Model directory
        dir: PathBuf,
    },
    /// Print the native-messaging host manifest
    Manifest {
        /// Extension id allowed to connect
        #[arg(long)]
        extension_id: String,
        /// Host binary path (default: this executable)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Write the manifest to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn export_output_flags(cli: &Cli) {
    if cli.json {
        std::env::set_var("PAGEGUARD_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("PAGEGUARD_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("PAGEGUARD_VERBOSE", "1");
    }
    if cli.no_color {
        std::env::set_var("PAGEGUARD_NO_COLOR", "1");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = launch::normalize_args(std::env::args_os(), std::io::stdin().is_terminal());
    let cli = Cli::parse_from(args);
    export_output_flags(&cli);
    logging::init(cli.log_format, cli.verbose, cli.quiet);

    let config = GuardConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Host { model, mode } => host_cmd::run(&config, model, mode).await,
        Commands::Train(args) => train_cmd::run(&config, args).await,
        Commands::Vocab { sources, out } => vocab_cmd::run(sources, out).await,
        Commands::Scan(args) => scan_cmd::run(&config, args).await,
        Commands::Inspect { dir } => inspect_cmd::run(&dir).await,
        Commands::Manifest {
            extension_id,
            path,
            output,
        } => manifest_cmd::run(&extension_id, path, output).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn parse(argv: &[&str]) -> Cli {
        let args = launch::normalize_args(argv.iter().map(OsString::from), true);
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_chrome_launch_runs_host() {
        let cli = parse(&["pageguard", "chrome-extension://abcdefghijklmnopabcdefghijklmnop/"]);
        assert!(matches!(
            cli.command,
            Commands::Host {
                model: None,
                mode: None
            }
        ));
    }

    #[test]
    fn test_firefox_launch_runs_host() {
        let cli = parse(&[
            "pageguard",
            "/home/u/.mozilla/native-messaging-hosts/com.pageguard.host.json",
            "pageguard@example.org",
        ]);
        assert!(matches!(cli.command, Commands::Host { .. }));
    }

    #[test]
    fn test_explicit_host_flags() {
        let cli = parse(&["pageguard", "host", "--mode", "either", "--model", "m"]);
        match cli.command {
            Commands::Host { model, mode } => {
                assert_eq!(model, Some(PathBuf::from("m")));
                assert_eq!(mode, Some(AnalysisMode::Either));
            }
            _ => panic!("expected host command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["pageguard", "scan", "hello", "--json", "-q"]);
        assert!(cli.json);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Scan(_)));
    }
}
