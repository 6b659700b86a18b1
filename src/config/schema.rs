//! Configuration schema definitions.
//!
//! This module contains the struct definitions that map to the YAML
//! deployment configuration file format.

use ethers_core::types::Address;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{CairnError, Result};

/// Static deployment parameters for one target network.
///
/// Supplied once at the start of a run and visible, read-only, to every
/// step's argument computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Network label (e.g. "sepolia"). Stamped into the state file and
    /// checked on resume so state from one network is never replayed
    /// against another.
    pub network: String,

    /// JSON-RPC endpoint of the node used for submission.
    pub rpc_url: String,

    /// Sender account. Must be unlocked on the node; signing stays
    /// node-side.
    pub from: Address,

    /// Final owner of the deployed system.
    pub owner: Address,

    /// Display label the currency token is constructed with.
    pub currency_label: String,

    /// Reference address of the externally deployed secondary factory.
    pub secondary_factory: Address,

    /// Gas price in wei applied to every submitted transaction.
    pub gas_price: u64,

    /// Optional gas limit; omitted lets the node estimate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,

    /// Confirmation depth required before the next step begins.
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,

    /// Maximum seconds to wait for one transaction's confirmations.
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,

    /// Directory holding per-contract artifact JSON files.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Path of the persisted migration state file.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

fn default_confirmations() -> u64 {
    1
}

fn default_confirmation_timeout() -> u64 {
    300
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_state_file() -> PathBuf {
    PathBuf::from("migration-state.yml")
}

impl DeployConfig {
    /// Validate the configuration before a run starts.
    ///
    /// Configuration errors are fatal up front; nothing is submitted with
    /// a config that fails here.
    pub fn validate(&self) -> Result<()> {
        if self.network.trim().is_empty() {
            return Err(CairnError::ConfigValidationError {
                message: "network must not be empty".into(),
            });
        }
        if self.rpc_url.trim().is_empty() {
            return Err(CairnError::ConfigValidationError {
                message: "rpc_url must not be empty".into(),
            });
        }
        if self.from.is_zero() {
            return Err(CairnError::ConfigValidationError {
                message: "from must not be the zero address".into(),
            });
        }
        if self.owner.is_zero() {
            return Err(CairnError::ConfigValidationError {
                message: "owner must not be the zero address".into(),
            });
        }
        if self.currency_label.trim().is_empty() {
            return Err(CairnError::ConfigValidationError {
                message: "currency_label must not be empty".into(),
            });
        }
        if self.gas_price == 0 {
            return Err(CairnError::ConfigValidationError {
                message: "gas_price must be positive".into(),
            });
        }
        if self.confirmations == 0 {
            return Err(CairnError::ConfigValidationError {
                message: "confirmations must be at least 1".into(),
            });
        }
        Ok(())
    }
}
