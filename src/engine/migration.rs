//! The migration engine.
//!
//! [`MigrationEngine`] owns the fixed ordered step list and the running
//! [`MigrationState`], and produces one [`StepBatch`] per step as a lazy
//! iterator. Each `next()` call runs exactly one step:
//!
//! 1. completion check, then argument computation and submission
//!    (via [`run_step`]);
//! 2. merge the returned delta into the running state;
//! 3. invoke the state hook with the *complete* updated state, so the
//!    hook can durably overwrite its persisted copy;
//! 4. yield the batch.
//!
//! The yield is the suspension point: the caller waits for confirmations
//! between pulls, so a process killed mid-wait has already durably
//! recorded the step it was waiting on, and a restart replays at most
//! that one step (safely, through its completion check).
//!
//! A fatal error halts the iterator permanently; state merged and
//! persisted before the failure stays valid and resumable, and remains
//! observable through [`MigrationEngine::state`].

use std::time::Duration;

use tracing::{debug, warn};

use crate::chain::Broadcaster;
use crate::config::DeployConfig;
use crate::error::Result;
use crate::state::MigrationState;
use crate::steps::completion::CheckResult;
use crate::steps::runner::{run_step, StepResult};
use crate::steps::StepDefinition;

/// Callback invoked with the complete state after every step.
pub type StateHook<'a> = Box<dyn FnMut(&MigrationState) -> Result<()> + 'a>;

/// The results of one step, yielded after its delta is persisted.
#[derive(Debug)]
pub struct StepBatch {
    /// Step key.
    pub key: String,

    /// Human-readable step title.
    pub title: String,

    /// Position in the fixed order (0-based).
    pub index: usize,

    /// Total number of steps in the plan.
    pub total: usize,

    /// Whether the step was satisfied by prior state.
    pub skipped: bool,

    /// The completion check that decided skip-or-execute.
    pub check: CheckResult,

    /// One result per action, submitted or replayed.
    pub results: Vec<StepResult>,
}

/// Drives a fixed, ordered list of steps against the ledger.
pub struct MigrationEngine<'a> {
    steps: Vec<StepDefinition>,
    state: MigrationState,
    config: &'a DeployConfig,
    broadcaster: &'a dyn Broadcaster,
    on_state_change: StateHook<'a>,
    cursor: usize,
    halted: bool,
}

impl<'a> MigrationEngine<'a> {
    /// Create an engine over a fixed step list and an initial state.
    ///
    /// `on_state_change` is the persistence seam: it receives the complete
    /// updated state after every step, before that step's batch is
    /// yielded.
    pub fn new(
        steps: Vec<StepDefinition>,
        state: MigrationState,
        config: &'a DeployConfig,
        broadcaster: &'a dyn Broadcaster,
        on_state_change: StateHook<'a>,
    ) -> Self {
        Self {
            steps,
            state,
            config,
            broadcaster,
            on_state_change,
            cursor: 0,
            halted: false,
        }
    }

    /// The running state, including everything merged so far.
    ///
    /// Valid after a fatal error too: a failed run must still make the
    /// latest state observable so operators know how far the deployment
    /// progressed.
    pub fn state(&self) -> &MigrationState {
        &self.state
    }

    /// Consume the engine and take the running state.
    pub fn into_state(self) -> MigrationState {
        self.state
    }

    /// Step keys in execution order.
    pub fn step_keys(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.key()).collect()
    }

    /// Number of steps not yet visited this run.
    pub fn remaining(&self) -> usize {
        self.steps.len().saturating_sub(self.cursor)
    }
}

impl Iterator for MigrationEngine<'_> {
    type Item = Result<StepBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted || self.cursor >= self.steps.len() {
            return None;
        }

        let step = &self.steps[self.cursor];
        let index = self.cursor;
        let total = self.steps.len();
        debug!(step = step.key(), index, total, "visiting step");

        let outcome = match run_step(step, &self.state, self.config, self.broadcaster) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(step = step.key(), error = %e, "run halted");
                self.halted = true;
                return Some(Err(e));
            }
        };

        // Merge, then persist, then yield. Order is the correctness
        // invariant: the hook must see step N's delta before the caller
        // sees step N's results.
        self.state.record(&outcome.key, outcome.record);
        if let Err(e) = (self.on_state_change)(&self.state) {
            warn!(step = step.key(), error = %e, "state hook failed, run halted");
            self.halted = true;
            return Some(Err(e));
        }

        let batch = StepBatch {
            key: outcome.key,
            title: step.title().to_string(),
            index,
            total,
            skipped: outcome.skipped,
            check: outcome.check,
            results: outcome.results,
        };

        self.cursor += 1;
        Some(Ok(batch))
    }
}

/// Summary of a finished (or aborted) run, assembled by the driver.
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Keys of steps that submitted actions this run.
    pub submitted: Vec<String>,

    /// Keys of steps satisfied by prior state.
    pub skipped: Vec<String>,

    /// Wall-clock duration of the run.
    pub duration: Duration,

    /// Whether every step completed.
    pub success: bool,
}

impl MigrationReport {
    /// Fold one batch into the summary.
    pub fn absorb(&mut self, batch: &StepBatch) {
        if batch.skipped {
            self.skipped.push(batch.key.clone());
        } else {
            self.submitted.push(batch.key.clone());
        }
    }

    /// Steps visited so far.
    pub fn visited(&self) -> usize {
        self.submitted.len() + self.skipped.len()
    }
}
