//! Run command implementation.
//!
//! The outer driver of the migration engine. Pulls one step batch at a
//! time; between pulls, waits for the batch's transactions to reach the
//! configured confirmation depth. By the time a batch is in hand its
//! state increment is already persisted, so interrupting the wait never
//! loses a completed step.

use std::path::Path;
use std::time::{Duration, Instant};

use console::style;
use tracing::info;

use crate::artifacts::ArtifactSet;
use crate::chain::{ConfirmationWaiter, JsonRpcBroadcaster, RpcConfirmationWaiter};
use crate::cli::args::RunArgs;
use crate::config::load_config;
use crate::engine::{MigrationEngine, MigrationReport, StepBatch};
use crate::error::Result;
use crate::migrations;
use crate::state::MigrationState;
use crate::steps::{run_check, StepDefinition};

/// Execute the `run` command.
pub fn execute(config_path: &Path, args: &RunArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let artifacts = ArtifactSet::load(&config.artifacts_dir, &migrations::CONTRACTS)?;
    let plan = migrations::deployment_plan(&artifacts)?;

    let mut state = MigrationState::load(&config.state_file)?;
    state.ensure_network(&config.network)?;

    if args.dry_run {
        return dry_run(&plan, &state);
    }

    let confirmations = args.confirmations.unwrap_or(config.confirmations);
    let timeout = Duration::from_secs(config.confirmation_timeout_secs);
    let broadcaster = JsonRpcBroadcaster::from_config(&config);
    let waiter = RpcConfirmationWaiter::new(config.rpc_url.clone());

    println!(
        "{} {} steps against {} as {:?}",
        style("Running").bold(),
        plan.len(),
        style(&config.network).cyan(),
        config.from,
    );
    info!(network = %config.network, steps = plan.len(), "starting run");

    let state_file = config.state_file.clone();
    let total = plan.len();
    let mut engine = MigrationEngine::new(
        plan,
        state,
        &config,
        &broadcaster,
        Box::new(move |s| s.save(&state_file)),
    );

    let started = Instant::now();
    match drive(&mut engine, &waiter, confirmations, timeout) {
        Ok(mut report) => {
            report.duration = started.elapsed();
            report.success = true;
            println!(
                "\n{} {} submitted, {} skipped in {:.1}s",
                style("Deployment complete:").green().bold(),
                report.submitted.len(),
                report.skipped.len(),
                report.duration.as_secs_f64(),
            );
            Ok(())
        }
        Err(e) => {
            // The run failed, but everything persisted before the failure
            // is valid; tell the operator exactly how far it got.
            let recorded = engine.state().len();
            eprintln!(
                "\n{} {} of {} steps recorded in {}",
                style("Deployment halted:").red().bold(),
                recorded,
                total,
                config.state_file.display(),
            );
            eprintln!("Re-running will skip completed steps and resume.");
            Err(e)
        }
    }
}

/// Pull batches until the plan is exhausted or a step fails.
fn drive(
    engine: &mut MigrationEngine<'_>,
    waiter: &dyn ConfirmationWaiter,
    confirmations: u64,
    timeout: Duration,
) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();

    while let Some(next) = engine.next() {
        let batch = next?;
        print_batch(&batch);

        // Confirmation waiting happens here, outside the engine, after
        // this step's state is already persisted.
        if !batch.skipped {
            wait_for_batch(waiter, &batch, confirmations, timeout)?;
        }
        report.absorb(&batch);
    }

    Ok(report)
}

fn print_batch(batch: &StepBatch) {
    println!(
        "[{}/{}] {}",
        batch.index + 1,
        batch.total,
        style(&batch.title).bold(),
    );

    if batch.skipped {
        println!(
            "      {} ({})",
            style("skipped").yellow(),
            batch.check.description,
        );
        return;
    }

    for result in &batch.results {
        match (result.tx_hash, result.address) {
            (Some(tx), Some(address)) => {
                println!("      {}  tx {:?}  address {:?}", result.action, tx, address)
            }
            (Some(tx), None) => println!("      {}  tx {:?}", result.action, tx),
            _ => println!("      {}", result.action),
        }
    }
}

/// Wait for every transaction in the batch, concurrently across the
/// batch's entries but never across steps.
fn wait_for_batch(
    waiter: &dyn ConfirmationWaiter,
    batch: &StepBatch,
    confirmations: u64,
    timeout: Duration,
) -> Result<()> {
    let hashes: Vec<_> = batch.results.iter().filter_map(|r| r.tx_hash).collect();
    if hashes.is_empty() {
        return Ok(());
    }

    println!(
        "      waiting for {} confirmation(s) of {} transaction(s)...",
        confirmations,
        hashes.len(),
    );

    let outcomes = std::thread::scope(|scope| {
        let handles: Vec<_> = hashes
            .iter()
            .map(|&tx| scope.spawn(move || waiter.wait(tx, confirmations, timeout)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("confirmation thread panicked"))
            .collect::<Vec<_>>()
    });

    for outcome in outcomes {
        let receipt = outcome?;
        info!(tx = ?receipt.tx_hash, block = receipt.block_number, "confirmed");
    }
    Ok(())
}

/// Preview which steps a run would skip or execute, without submitting.
fn dry_run(plan: &[StepDefinition], state: &MigrationState) -> Result<()> {
    println!("{}", style("Dry run (nothing will be submitted)").bold());

    for (index, step) in plan.iter().enumerate() {
        let check = run_check(step.completion(), step.key(), state);
        let verdict = if check.complete {
            style("would skip").yellow()
        } else {
            style("would execute").green()
        };
        println!(
            "[{}/{}] {}  {} ({})",
            index + 1,
            plan.len(),
            style(step.title()).bold(),
            verdict,
            check.description,
        );
    }
    Ok(())
}
