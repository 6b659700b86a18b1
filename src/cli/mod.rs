//! Command-line interface for Cairn.
//!
//! This module provides the CLI argument parsing using clap's derive
//! macros and the command implementations.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations
//!
//! The `run` command is the outer driver of the migration engine: it
//! pulls one step batch at a time and waits for confirmations between
//! pulls, which is exactly the suspension point the engine exposes.

pub mod args;
pub mod commands;

use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::error::Result;

pub use args::{Cli, Commands, ResetArgs, RunArgs, StatusArgs};

/// Route a parsed CLI invocation to its command implementation.
pub fn dispatch(cli: &Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    match &cli.command {
        Commands::Run(args) => commands::run::execute(&config_path, args),
        Commands::Status(args) => commands::status::execute(&config_path, args),
        Commands::Reset(args) => commands::reset::execute(&config_path, args),
    }
}
