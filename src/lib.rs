//! Cairn - Resumable contract deployment migrations.
//!
//! Cairn deploys a fixed, ordered set of contracts and configuration
//! transactions against an EVM network, persisting a state snapshot after
//! every step so a killed or failed run resumes exactly where it stopped
//! without re-submitting completed work.
//!
//! # Modules
//!
//! - [`artifacts`] - Contract artifact loading and checksums
//! - [`chain`] - Broadcaster and confirmation-waiter interfaces, JSON-RPC
//!   implementations
//! - [`cli`] - Command-line interface and the outer run driver
//! - [`config`] - Deployment configuration loading and validation
//! - [`engine`] - The migration engine: ordered, resumable step driving
//! - [`error`] - Error types and result aliases
//! - [`migrations`] - The fixed deployment plan
//! - [`state`] - Migration state and its persistence
//! - [`steps`] - Step definitions, completion checks, and execution
//!
//! # Example
//!
//! ```
//! use cairn::state::{MigrationState, StepRecord};
//!
//! // Resumption treats recorded results as authoritative: once a step's
//! // record satisfies its completion check, re-runs replay it instead of
//! // re-submitting.
//! let mut state = MigrationState::new();
//! state.record("currency_token", StepRecord::default());
//! assert!(state.is_recorded("currency_token"));
//! ```

pub mod artifacts;
pub mod chain;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod migrations;
pub mod state;
pub mod steps;

pub use error::{CairnError, Result};
