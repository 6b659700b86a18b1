//! Single-step execution.
//!
//! [`run_step`] executes one [`StepDefinition`] against the current state:
//! completion check first, then argument computation and submission. It
//! returns the state delta and per-action results; it never mutates state,
//! never persists, and never retries: every failure propagates
//! immediately and aborts the run.

use chrono::Utc;
use tracing::{debug, info};

use crate::chain::{ActionRequest, Broadcaster};
use crate::config::DeployConfig;
use crate::error::Result;
use crate::state::{MigrationState, StepRecord, TxRecord};
use crate::steps::completion::{run_check, CheckResult};
use crate::steps::definition::StepDefinition;

/// How one result entry came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The action was submitted to the ledger during this run.
    Submitted,

    /// The action was already recorded; its prior result was replayed
    /// without resubmission.
    Replayed,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Submitted => "submitted",
            StepStatus::Replayed => "replayed",
        };
        write!(f, "{}", s)
    }
}

/// One outcome of executing (or replaying) a step's action.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Key of the step this result belongs to.
    pub step: String,

    /// Whether the action was submitted now or replayed from state.
    pub status: StepStatus,

    /// Label of the action, e.g. `deploy CurrencyToken`.
    pub action: String,

    /// Hash of the submitted transaction, if one was recorded.
    pub tx_hash: Option<ethers_core::types::H256>,

    /// Resulting reference, e.g. a deployed contract's address.
    pub address: Option<ethers_core::types::Address>,
}

/// Everything a step execution hands back to the engine.
#[derive(Debug)]
pub struct StepOutcome {
    /// Key of the executed step.
    pub key: String,

    /// Whether the completion check skipped execution.
    pub skipped: bool,

    /// The completion check that decided skip-or-execute.
    pub check: CheckResult,

    /// The state delta this step is responsible for writing.
    pub record: StepRecord,

    /// One result per action (submitted or replayed).
    pub results: Vec<StepResult>,
}

/// Execute one step against the current state.
pub fn run_step(
    step: &StepDefinition,
    state: &MigrationState,
    config: &DeployConfig,
    broadcaster: &dyn Broadcaster,
) -> Result<StepOutcome> {
    let check = run_check(step.completion(), step.key(), state);
    if check.complete {
        debug!(step = step.key(), check = %check.description, "skipping");
        return Ok(replay(step, state, check));
    }

    let actions = step.plan(state, config)?;
    info!(step = step.key(), actions = actions.len(), "executing");

    let mut record = StepRecord {
        recorded_at: Some(Utc::now()),
        ..Default::default()
    };
    let mut results = Vec::with_capacity(actions.len());

    for action in &actions {
        let pending = broadcaster.submit(action)?;

        if let ActionRequest::Deploy { checksum, .. } = action {
            record.artifact_checksum = Some(checksum.clone());
        }
        if record.address.is_none() {
            record.address = pending.contract_address;
        }
        record.transactions.push(TxRecord {
            hash: pending.hash,
            action: action.describe(),
            submitted_at: Utc::now(),
        });

        results.push(StepResult {
            step: step.key().to_string(),
            status: StepStatus::Submitted,
            action: action.describe(),
            tx_hash: Some(pending.hash),
            address: pending.contract_address,
        });
    }

    Ok(StepOutcome {
        key: step.key().to_string(),
        skipped: false,
        check,
        record,
        results,
    })
}

/// Build the replay outcome for an already-complete step: its recorded
/// result(s), no submission, and the existing record as an unchanged delta.
fn replay(step: &StepDefinition, state: &MigrationState, check: CheckResult) -> StepOutcome {
    let record = state.get(step.key()).cloned().unwrap_or_default();

    let results = if record.transactions.is_empty() {
        vec![StepResult {
            step: step.key().to_string(),
            status: StepStatus::Replayed,
            action: step.title().to_string(),
            tx_hash: None,
            address: record.address,
        }]
    } else {
        record
            .transactions
            .iter()
            .map(|tx| StepResult {
                step: step.key().to_string(),
                status: StepStatus::Replayed,
                action: tx.action.clone(),
                tx_hash: Some(tx.hash),
                address: record.address,
            })
            .collect()
    };

    StepOutcome {
        key: step.key().to_string(),
        skipped: true,
        check,
        record,
        results,
    }
}
