//! Reset command implementation.
//!
//! The explicit-restart escape hatch. Completion checks treat recorded
//! results as authoritative, so a step whose recorded transaction never
//! actually landed on-chain must be cleared by hand before a re-run will
//! resubmit it.

use std::path::Path;

use console::style;
use dialoguer::Confirm;

use crate::cli::args::ResetArgs;
use crate::config::load_config;
use crate::error::{CairnError, Result};
use crate::migrations;
use crate::state::MigrationState;

/// Execute the `reset` command.
pub fn execute(config_path: &Path, args: &ResetArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let mut state = MigrationState::load(&config.state_file)?;

    let description = match (&args.step, args.all) {
        (Some(key), _) => {
            if !migrations::STEP_KEYS.contains(&key.as_str()) {
                return Err(CairnError::UnknownStep { key: key.clone() });
            }
            if !state.is_recorded(key) {
                println!("Nothing recorded for '{}'.", key);
                return Ok(());
            }
            format!("Clear the recorded result of step '{}'?", key)
        }
        (None, true) => {
            if state.is_empty() {
                println!("Nothing recorded.");
                return Ok(());
            }
            format!("Clear all {} recorded step(s)?", state.len())
        }
        (None, false) => {
            return Err(CairnError::ConfigValidationError {
                message: "reset needs --step <key> or --all".into(),
            });
        }
    };

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "{} A re-run will resubmit cleared steps.",
                description
            ))
            .default(false)
            .interact()
            .map_err(|e| CairnError::Other(e.into()))?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    match &args.step {
        Some(key) => {
            state.clear(key);
            println!("{} cleared '{}'", style("Reset:").bold(), key);
        }
        None => {
            state.clear_all();
            println!("{} cleared all steps", style("Reset:").bold());
        }
    }

    state.save(&config.state_file)?;
    Ok(())
}
