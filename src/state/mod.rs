//! Migration state: the durable record of completed steps.
//!
//! [`MigrationState`] maps step keys to [`StepRecord`]s. It is owned and
//! mutated exclusively by the engine's driving loop; steps read it and
//! return deltas. Persistence lives in [`store`]: the whole state is
//! rewritten after every step.

pub mod store;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ethers_core::types::{Address, H256};
use serde::{Deserialize, Serialize};

use crate::error::{CairnError, Result};

/// The recorded output of one step.
///
/// A record proves *submission*, not confirmation: a process killed
/// between submission and confirmation leaves a record for transactions
/// that may never have landed. Resumption treats the record as
/// authoritative regardless; `cairn reset` is the operator remedy when a
/// recorded transaction did not survive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepRecord {
    /// Address produced by the step, if it deployed a contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    /// Every transaction the step submitted, in submission order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<TxRecord>,

    /// SHA-256 of the artifact bytecode that was deployed. Used by
    /// `status` to surface artifact drift; never triggers re-deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_checksum: Option<String>,

    /// When the record was written, i.e. when submission happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

/// One submitted transaction inside a step record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecord {
    /// Transaction hash.
    pub hash: H256,

    /// Label of the action that produced it, e.g. `deploy CurrencyToken`.
    pub action: String,

    /// Submission time.
    pub submitted_at: DateTime<Utc>,
}

/// Append-only-by-key mapping from step key to recorded output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationState {
    /// Schema version for migration of the state file itself.
    pub version: u32,

    /// Network label the state was first recorded against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    /// Per-step records, keyed by step key. Ordering of the map implies
    /// nothing; execution order comes from the deployment plan.
    #[serde(default)]
    pub entries: BTreeMap<String, StepRecord>,
}

impl Default for MigrationState {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationState {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Create an empty state.
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            network: None,
            entries: BTreeMap::new(),
        }
    }

    /// Get the record for a step.
    pub fn get(&self, key: &str) -> Option<&StepRecord> {
        self.entries.get(key)
    }

    /// Whether any record exists for a step.
    pub fn is_recorded(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Merge a step's delta into the state. Last write wins; in practice
    /// every key is written by exactly one step.
    pub fn record(&mut self, key: &str, record: StepRecord) {
        self.entries.insert(key.to_string(), record);
    }

    /// Remove one step's record. Only operator commands call this.
    pub fn clear(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove every record.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Address recorded for a step, if any.
    pub fn address_of(&self, key: &str) -> Option<Address> {
        self.entries.get(key).and_then(|r| r.address)
    }

    /// Address a later step depends on.
    ///
    /// The canonical prerequisite accessor for plan functions: absence is
    /// a fatal [`CairnError::MissingPrerequisite`] naming both the step
    /// that asked and the step it needs.
    pub fn require_address(&self, step: &str, requires: &str) -> Result<Address> {
        self.address_of(requires)
            .ok_or_else(|| CairnError::MissingPrerequisite {
                step: step.to_string(),
                requires: requires.to_string(),
            })
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no step has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recorded step keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
