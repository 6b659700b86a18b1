//! Step definition and execution.
//!
//! This module provides the per-step building blocks of the migration
//! engine:
//!
//! - [`StepDefinition`] - A declarative unit of deployable work
//! - [`CompletionCheck`] / [`run_check`] - Skip predicates for idempotency
//! - [`run_step`] - Execute one step against the current state
//! - [`StepStatus`] / [`StepResult`] - Per-action execution results
//!
//! A step never mutates state or persists anything; it reads the current
//! [`crate::state::MigrationState`], and [`run_step`] returns the delta the
//! engine merges.

pub mod completion;
pub mod definition;
pub mod runner;

pub use completion::{run_check, CheckResult, CompletionCheck};
pub use definition::{PlanFn, StepDefinition};
pub use runner::{run_step, StepOutcome, StepResult, StepStatus};
