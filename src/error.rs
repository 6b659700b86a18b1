//! Error types for Cairn operations.
//!
//! This module defines [`CairnError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `CairnError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `CairnError::Other`) for unexpected errors
//! - No variant is retried internally: a fatal error aborts the run and the
//!   persisted migration state is the resumption mechanism

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for Cairn operations.
#[derive(Debug, Error)]
pub enum CairnError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// Contract artifact file does not exist.
    #[error("Artifact '{name}' not found: {path}")]
    ArtifactNotFound { name: String, path: PathBuf },

    /// Contract artifact file could not be parsed.
    #[error("Failed to parse artifact '{name}': {message}")]
    ArtifactParseError { name: String, message: String },

    /// Failed to parse the persisted migration state.
    #[error("Failed to parse state at {path}: {message}")]
    StateParseError { path: PathBuf, message: String },

    /// Failed to persist the migration state.
    #[error("Failed to persist state: {message}")]
    StatePersistError { message: String },

    /// Persisted state belongs to a different network than configured.
    #[error("State was recorded against network '{recorded}' but config names '{configured}'")]
    NetworkMismatch { recorded: String, configured: String },

    /// A step's argument computation needs a state entry that is absent.
    #[error("Step '{step}' requires the recorded result of '{requires}', which is missing")]
    MissingPrerequisite { step: String, requires: String },

    /// A command referenced a step key not present in the deployment plan.
    #[error("Unknown step: {key}")]
    UnknownStep { key: String },

    /// The broadcaster rejected or failed to submit an action.
    #[error("Submission of '{action}' failed: {message}")]
    SubmissionFailed { action: String, message: String },

    /// Transport or protocol failure talking to the node.
    #[error("RPC error: {message}")]
    RpcError { message: String },

    /// A submitted transaction was mined but reverted.
    #[error("Transaction {tx} reverted on-chain")]
    TransactionReverted { tx: String },

    /// A transaction did not reach the required confirmation depth in time.
    #[error("Timed out after {waited_secs}s waiting for confirmation of {tx}")]
    ConfirmationTimeout { tx: String, waited_secs: u64 },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Cairn operations.
pub type Result<T> = std::result::Result<T, CairnError>;
