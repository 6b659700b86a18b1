//! Configuration file loading.
//!
//! Loads the deployment configuration from a YAML file and applies
//! environment overrides before validation.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::schema::DeployConfig;
use crate::error::{CairnError, Result};

/// Environment variable that overrides the configured RPC URL.
///
/// Keeps node endpoints (often carrying access tokens) out of checked-in
/// configuration files.
pub const RPC_URL_ENV: &str = "CAIRN_RPC_URL";

/// Load and validate a deployment configuration.
pub fn load_config(path: &Path) -> Result<DeployConfig> {
    if !path.exists() {
        return Err(CairnError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    let mut config: DeployConfig =
        serde_yaml::from_str(&content).map_err(|e| CairnError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if let Ok(url) = std::env::var(RPC_URL_ENV) {
        debug!("rpc_url overridden from {}", RPC_URL_ENV);
        config.rpc_url = url;
    }

    config.validate()?;
    Ok(config)
}
