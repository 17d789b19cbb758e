//! Native-messaging host and command-line tools for PageGuard.
//!
//! The `pageguard` binary answers the browser extension's `analyze`
//! messages over stdin/stdout and trains, inspects, and exercises models
//! offline.

pub mod cli;
pub mod config;
pub mod host;
pub mod logging;
