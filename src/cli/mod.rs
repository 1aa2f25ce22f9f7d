//! Command-line interface for musik.
//!
//! This module provides the ingest, sync, stats, list, match and config
//! commands.

mod commands;

pub use commands::{Cli, Commands, run_command};
