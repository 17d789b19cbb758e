//! Tracing subscriber setup.
//!
//! Logs always go to stderr: stdout carries native-messaging frames and
//! `--json` command output.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Default filter directives when `RUST_LOG` is unset.
pub fn default_directives(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "pageguard=warn,pageguard_host=warn"
    } else if verbose {
        "pageguard=debug,pageguard_host=debug"
    } else {
        "pageguard=info,pageguard_host=info"
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the defaults.
pub fn init(format: LogFormat, verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose, quiet)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert!(default_directives(false, false).contains("pageguard=info"));
        assert!(default_directives(true, false).contains("pageguard=debug"));
        assert!(default_directives(true, true).contains("pageguard=warn"));
    }
}
