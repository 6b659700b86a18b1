//! Migration state persistence.
//!
//! The state file is a YAML snapshot of the complete [`MigrationState`],
//! rewritten wholesale after every step. Delta persistence is deliberately
//! not supported: recovery semantics depend on every snapshot being a full,
//! self-contained picture of the deployment.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{CairnError, Result};
use crate::state::MigrationState;

impl MigrationState {
    /// Load state from disk. A missing file is an empty state, not an
    /// error: a fresh deployment starts with nothing recorded.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no state file, starting empty");
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let state: Self =
            serde_yaml::from_str(&content).map_err(|e| CairnError::StateParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        debug!(path = %path.display(), steps = state.len(), "loaded state");
        Ok(state)
    }

    /// Save state to disk using atomic write.
    ///
    /// Write-to-temp-then-rename so a crash mid-write never corrupts the
    /// previous snapshot. The previous snapshot staying intact is what
    /// makes killing the process at any point recoverable.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content =
            serde_yaml::to_string(self).map_err(|e| CairnError::StatePersistError {
                message: format!("failed to serialize state: {}", e),
            })?;

        let temp_path = path.with_extension("yml.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        debug!(path = %path.display(), steps = self.len(), "state persisted");
        Ok(())
    }

    /// Stamp the configured network on first use, or fail if the state
    /// was recorded against a different one. Replaying one network's
    /// addresses into another would wire the deployed system to contracts
    /// that do not exist there.
    pub fn ensure_network(&mut self, configured: &str) -> Result<()> {
        match &self.network {
            None => {
                self.network = Some(configured.to_string());
                Ok(())
            }
            Some(recorded) if recorded == configured => Ok(()),
            Some(recorded) => Err(CairnError::NetworkMismatch {
                recorded: recorded.clone(),
                configured: configured.to_string(),
            }),
        }
    }
}
