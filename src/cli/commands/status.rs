//! Status command implementation.
//!
//! Renders the persisted migration state against the deployment plan:
//! which steps are complete, what they produced, and whether any deployed
//! artifact has drifted from the one on disk.

use std::path::Path;

use console::style;

use crate::artifacts::ArtifactSet;
use crate::cli::args::StatusArgs;
use crate::config::load_config;
use crate::error::{CairnError, Result};
use crate::migrations;
use crate::state::MigrationState;
use crate::steps::{run_check, StepDefinition};

/// Execute the `status` command.
pub fn execute(config_path: &Path, args: &StatusArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let artifacts = ArtifactSet::load(&config.artifacts_dir, &migrations::CONTRACTS)?;
    let plan = migrations::deployment_plan(&artifacts)?;
    let state = MigrationState::load(&config.state_file)?;

    println!(
        "{} {} ({})",
        style("Deployment status for").bold(),
        style(&config.network).cyan(),
        config.state_file.display(),
    );
    if let Some(recorded) = &state.network {
        if recorded != &config.network {
            println!(
                "{} state was recorded against '{}'",
                style("warning:").red().bold(),
                recorded,
            );
        }
    }
    println!();

    if let Some(key) = &args.step {
        let step = plan
            .iter()
            .find(|s| s.key() == key.as_str())
            .ok_or_else(|| CairnError::UnknownStep { key: key.clone() })?;
        print_step(step, &state, &artifacts);
        return Ok(());
    }

    for step in &plan {
        print_step(step, &state, &artifacts);
    }

    let complete = plan
        .iter()
        .filter(|s| run_check(s.completion(), s.key(), &state).complete)
        .count();
    println!(
        "\n{} of {} steps complete",
        style(complete).bold(),
        plan.len(),
    );
    Ok(())
}

fn print_step(step: &StepDefinition, state: &MigrationState, artifacts: &ArtifactSet) {
    let check = run_check(step.completion(), step.key(), state);
    let marker = if check.complete {
        style("✓").green()
    } else {
        style("○").dim()
    };
    println!("{} {}  {}", marker, style(step.key()).bold(), step.title());

    let Some(record) = state.get(step.key()) else {
        println!("    not yet recorded");
        return;
    };

    if let Some(address) = record.address {
        println!("    address {:?}", address);
    }
    for tx in &record.transactions {
        println!("    {}  tx {:?}", tx.action, tx.hash);
    }
    if let Some(at) = record.recorded_at {
        println!("    recorded {}", at.format("%Y-%m-%d %H:%M UTC"));
    }

    // Drift check: recorded checksum vs the artifact currently on disk.
    // Informational only; a recorded step is authoritative either way.
    if let (Some(recorded), Some(contract)) = (
        record.artifact_checksum.as_deref(),
        migrations::artifact_for(step.key()),
    ) {
        if let Ok(artifact) = artifacts.get(contract) {
            if artifact.checksum() != recorded {
                println!(
                    "    {} artifact {} has changed since deployment",
                    style("drift:").yellow().bold(),
                    contract,
                );
            }
        }
    }
}
