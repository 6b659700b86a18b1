//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cairn - Resumable contract deployment migrations.
#[derive(Debug, Parser)]
#[command(name = "cairn")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides default deploy.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the deployment migration, resuming from persisted state
    Run(RunArgs),

    /// Show per-step deployment status
    Status(StatusArgs),

    /// Clear recorded step results (explicit restart)
    Reset(ResetArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Check which steps would run without submitting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Override the configured confirmation depth
    #[arg(long)]
    pub confirmations: Option<u64>,
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, clap::Args)]
pub struct StatusArgs {
    /// Show a single step
    #[arg(long)]
    pub step: Option<String>,
}

/// Arguments for the `reset` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ResetArgs {
    /// Step key to clear
    #[arg(long, conflicts_with = "all")]
    pub step: Option<String>,

    /// Clear every recorded step
    #[arg(long)]
    pub all: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}
