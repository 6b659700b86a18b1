//! Contract artifact loading.
//!
//! Artifacts are the opaque per-step payloads: compiled bytecode plus ABI,
//! one JSON file per contract in the configured artifacts directory. The
//! file format is the common compiler output shape:
//!
//! ```json
//! { "contractName": "Exchange", "abi": [...], "bytecode": "0x6080..." }
//! ```
//!
//! Each artifact exposes a SHA-256 checksum of its bytecode. The checksum
//! is recorded into migration state at deployment so a later `status` can
//! report artifact drift without ever re-deploying on its own.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{CairnError, Result};

/// A compiled contract ready for deployment.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    /// Contract name, matching the artifact file stem.
    pub name: String,

    /// Creation bytecode, hex-decoded.
    pub bytecode: Vec<u8>,

    /// Raw ABI, kept opaque. The broadcaster receives full signatures per
    /// action, so nothing here is interpreted beyond round-tripping.
    pub abi: serde_json::Value,
}

/// On-disk artifact file shape.
#[derive(Debug, Deserialize)]
struct ArtifactFile {
    #[serde(default)]
    #[serde(rename = "contractName")]
    contract_name: Option<String>,
    abi: serde_json::Value,
    bytecode: String,
}

impl ContractArtifact {
    /// Load one artifact from `<dir>/<name>.json`.
    pub fn load(dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(format!("{}.json", name));
        if !path.exists() {
            return Err(CairnError::ArtifactNotFound {
                name: name.to_string(),
                path,
            });
        }

        let content = fs::read_to_string(&path)?;
        let file: ArtifactFile =
            serde_json::from_str(&content).map_err(|e| CairnError::ArtifactParseError {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        if let Some(declared) = &file.contract_name {
            if declared != name {
                return Err(CairnError::ArtifactParseError {
                    name: name.to_string(),
                    message: format!("artifact declares contractName '{}'", declared),
                });
            }
        }

        let hex_body = file.bytecode.trim_start_matches("0x");
        let bytecode = hex::decode(hex_body).map_err(|e| CairnError::ArtifactParseError {
            name: name.to_string(),
            message: format!("invalid bytecode hex: {}", e),
        })?;
        if bytecode.is_empty() {
            return Err(CairnError::ArtifactParseError {
                name: name.to_string(),
                message: "bytecode is empty".into(),
            });
        }

        debug!(contract = name, bytes = bytecode.len(), "loaded artifact");

        Ok(Self {
            name: name.to_string(),
            bytecode,
            abi: file.abi,
        })
    }

    /// SHA-256 checksum of the creation bytecode, hex-encoded.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytecode);
        hex::encode(hasher.finalize())
    }
}

/// The fixed set of artifacts a deployment plan needs, resolved by name.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    artifacts: HashMap<String, ContractArtifact>,
}

impl ArtifactSet {
    /// Load every named artifact from the given directory.
    pub fn load(dir: &Path, names: &[&str]) -> Result<Self> {
        let mut artifacts = HashMap::new();
        for name in names {
            artifacts.insert(name.to_string(), ContractArtifact::load(dir, name)?);
        }
        Ok(Self { artifacts })
    }

    /// Insert an artifact directly. Used by tests to build sets without
    /// touching the filesystem.
    pub fn insert(&mut self, artifact: ContractArtifact) {
        self.artifacts.insert(artifact.name.clone(), artifact);
    }

    /// Resolve an artifact by contract name.
    pub fn get(&self, name: &str) -> Result<&ContractArtifact> {
        self.artifacts
            .get(name)
            .ok_or_else(|| CairnError::ArtifactNotFound {
                name: name.to_string(),
                path: Path::new("<unloaded>").join(format!("{}.json", name)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_artifact(dir: &Path, name: &str, bytecode: &str) {
        let body = serde_json::json!({
            "contractName": name,
            "abi": [],
            "bytecode": bytecode,
        });
        fs::write(dir.join(format!("{}.json", name)), body.to_string()).unwrap();
    }

    #[test]
    fn load_decodes_bytecode() {
        let temp = TempDir::new().unwrap();
        write_artifact(temp.path(), "CurrencyToken", "0x60806040");

        let artifact = ContractArtifact::load(temp.path(), "CurrencyToken").unwrap();
        assert_eq!(artifact.bytecode, vec![0x60, 0x80, 0x60, 0x40]);
    }

    #[test]
    fn load_missing_file_is_artifact_not_found() {
        let temp = TempDir::new().unwrap();
        let err = ContractArtifact::load(temp.path(), "Nope").unwrap_err();
        assert!(matches!(err, CairnError::ArtifactNotFound { .. }));
    }

    #[test]
    fn load_rejects_bad_hex() {
        let temp = TempDir::new().unwrap();
        write_artifact(temp.path(), "Bad", "0xzz");

        let err = ContractArtifact::load(temp.path(), "Bad").unwrap_err();
        assert!(matches!(err, CairnError::ArtifactParseError { .. }));
    }

    #[test]
    fn load_rejects_empty_bytecode() {
        let temp = TempDir::new().unwrap();
        write_artifact(temp.path(), "Empty", "0x");

        let err = ContractArtifact::load(temp.path(), "Empty").unwrap_err();
        assert!(matches!(err, CairnError::ArtifactParseError { .. }));
    }

    #[test]
    fn load_rejects_mismatched_contract_name() {
        let temp = TempDir::new().unwrap();
        let body = serde_json::json!({
            "contractName": "Other",
            "abi": [],
            "bytecode": "0x00",
        });
        fs::write(temp.path().join("Exchange.json"), body.to_string()).unwrap();

        let err = ContractArtifact::load(temp.path(), "Exchange").unwrap_err();
        assert!(matches!(err, CairnError::ArtifactParseError { .. }));
    }

    #[test]
    fn checksum_is_stable_and_content_addressed() {
        let temp = TempDir::new().unwrap();
        write_artifact(temp.path(), "A", "0x6080");
        write_artifact(temp.path(), "B", "0x6080");
        write_artifact(temp.path(), "C", "0x6081");

        let a = ContractArtifact::load(temp.path(), "A").unwrap();
        let b = ContractArtifact::load(temp.path(), "B").unwrap();
        let c = ContractArtifact::load(temp.path(), "C").unwrap();

        assert_eq!(a.checksum(), b.checksum());
        assert_ne!(a.checksum(), c.checksum());
        assert_eq!(a.checksum().len(), 64);
    }

    #[test]
    fn artifact_set_resolves_by_name() {
        let temp = TempDir::new().unwrap();
        write_artifact(temp.path(), "CurrencyToken", "0x01");
        write_artifact(temp.path(), "Exchange", "0x02");

        let set = ArtifactSet::load(temp.path(), &["CurrencyToken", "Exchange"]).unwrap();
        assert_eq!(set.get("Exchange").unwrap().bytecode, vec![0x02]);
        assert!(set.get("Registry").is_err());
    }
}
