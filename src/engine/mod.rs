//! Migration engine orchestration.
//!
//! The engine drives a fixed, ordered list of steps one at a time,
//! merging each step's delta into the running state and persisting it
//! before yielding the step's results. See [`migration::MigrationEngine`].

pub mod migration;

pub use migration::{MigrationEngine, MigrationReport, StateHook, StepBatch};
