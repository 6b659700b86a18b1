//! Completion check implementations.
//!
//! Completion checks decide whether a step's recorded state already
//! satisfies it, making repeated runs against the same persisted state
//! safe. The predicate is explicit per step: a multi-action step that
//! recorded only some of its transactions must not be treated as done.

use crate::state::MigrationState;

/// The finished-predicate of one step.
#[derive(Debug, Clone)]
pub enum CompletionCheck {
    /// Complete once an address is recorded for the step.
    AddressRecorded,

    /// Complete once at least `count` transactions are recorded.
    TransactionsRecorded { count: usize },

    /// Complete once every inner check passes.
    All { checks: Vec<CompletionCheck> },
}

/// Result of running a completion check.
///
/// The `description` is user-visible: it appears in skip messages and in
/// the run summary.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Whether the check passed (step is complete).
    pub complete: bool,

    /// Description of what was checked.
    pub description: String,

    /// Details about the check result.
    pub details: Option<String>,
}

impl CheckResult {
    /// Create a complete result.
    pub fn complete(description: impl Into<String>) -> Self {
        Self {
            complete: true,
            description: description.into(),
            details: None,
        }
    }

    /// Create an incomplete result.
    pub fn incomplete(description: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            complete: false,
            description: description.into(),
            details: Some(details.into()),
        }
    }
}

/// Run a completion check for a step against the current state.
pub fn run_check(check: &CompletionCheck, key: &str, state: &MigrationState) -> CheckResult {
    match check {
        CompletionCheck::AddressRecorded => check_address(key, state),
        CompletionCheck::TransactionsRecorded { count } => check_transactions(key, *count, state),
        CompletionCheck::All { checks } => check_all(checks, key, state),
    }
}

fn check_address(key: &str, state: &MigrationState) -> CheckResult {
    match state.address_of(key) {
        Some(address) => CheckResult::complete(format!("Address recorded: {:?}", address)),
        None => CheckResult::incomplete(
            "No address recorded",
            format!("State has no deployed address under '{}'", key),
        ),
    }
}

fn check_transactions(key: &str, count: usize, state: &MigrationState) -> CheckResult {
    let recorded = state.get(key).map(|r| r.transactions.len()).unwrap_or(0);
    if recorded >= count {
        CheckResult::complete(format!("{} transaction(s) recorded", recorded))
    } else {
        CheckResult::incomplete(
            format!("{} of {} transaction(s) recorded", recorded, count),
            format!("Step '{}' has not submitted all of its actions", key),
        )
    }
}

fn check_all(checks: &[CompletionCheck], key: &str, state: &MigrationState) -> CheckResult {
    for check in checks {
        let result = run_check(check, key, state);
        if !result.complete {
            return result;
        }
    }
    CheckResult::complete("All checks passed")
}
