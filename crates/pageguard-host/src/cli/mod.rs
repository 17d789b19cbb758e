//! CLI subcommand implementations for the `pageguard` binary.

pub mod host_cmd;
pub mod inspect_cmd;
pub mod launch;
pub mod manifest_cmd;
pub mod output;
pub mod scan_cmd;
pub mod train_cmd;
pub mod vocab_cmd;
