//! Artifact registry: compiled contracts stored as json files, looked up by contract name.
//!
//! Artifacts live at `<root>/<source file>/<ContractName>.json`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{hex, primitives::Bytes};
use json::JsonValue;
use tracing::debug;

use crate::{constants::ARTIFACT_FORMAT, errors::ScriptError};

/// A compiled contract
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: JsonValue,
    /// Hex encoded creation code
    pub bytecode: String,
    /// Hex encoded runtime code
    pub deployed_bytecode: String,
}

impl Artifact {
    /// Parse an artifact json document
    pub fn from_json(content: &str) -> Result<Self, ScriptError> {
        let parsed = json::parse(content).map_err(|e| ScriptError::Artifact(e.to_string()))?;

        let field = |key: &str| -> Result<String, ScriptError> {
            parsed[key]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| ScriptError::Artifact(format!("missing '{key}' field")))
        };

        if !parsed["abi"].is_array() {
            return Err(ScriptError::Artifact(String::from("missing 'abi' field")));
        }

        Ok(Artifact {
            contract_name: field("contractName")?,
            source_name: field("sourceName")?,
            abi: parsed["abi"].clone(),
            bytecode: field("bytecode")?,
            deployed_bytecode: parsed["deployedBytecode"].as_str().unwrap_or("0x").to_string(),
        })
    }

    /// Serialize the artifact, with empty link references
    pub fn to_json(&self) -> JsonValue {
        let mut value = JsonValue::new_object();
        value["_format"] = ARTIFACT_FORMAT.into();
        value["contractName"] = self.contract_name.as_str().into();
        value["sourceName"] = self.source_name.as_str().into();
        value["abi"] = self.abi.clone();
        value["bytecode"] = self.bytecode.as_str().into();
        value["deployedBytecode"] = self.deployed_bytecode.as_str().into();
        value["linkReferences"] = JsonValue::new_object();
        value["deployedLinkReferences"] = JsonValue::new_object();
        value
    }

    /// Number of arguments the constructor takes
    pub fn constructor_inputs(&self) -> usize {
        self.abi
            .members()
            .find(|item| item["type"] == "constructor")
            .map_or(0, |constructor| constructor["inputs"].len())
    }

    /// Creation code, ready to be sent without constructor arguments
    pub fn creation_code(&self) -> Result<Bytes, ScriptError> {
        let code = self.bytecode.trim().trim_start_matches("0x");
        if code.is_empty() {
            return Err(ScriptError::Artifact(format!(
                "{} has no bytecode, abstract contracts and interfaces can't be deployed",
                self.contract_name
            )));
        }
        if code.contains("__") {
            return Err(ScriptError::Artifact(format!(
                "{} has unlinked library references",
                self.contract_name
            )));
        }

        let inputs = self.constructor_inputs();
        if inputs > 0 {
            return Err(ScriptError::Artifact(format!(
                "{} constructor expects {} arguments, none are supported",
                self.contract_name, inputs
            )));
        }

        hex::decode(code)
            .map(Bytes::from)
            .map_err(|e| ScriptError::Artifact(format!("invalid bytecode: {e}")))
    }
}

/// Maps contract names to the artifacts found under a directory
pub struct ArtifactRegistry {
    root: PathBuf,
}

impl ArtifactRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the artifact of `contract_name`
    pub fn artifact(&self, contract_name: &str) -> Result<Artifact, ScriptError> {
        let path = self.artifact_path(contract_name)?;
        debug!("Reading artifact {}", path.display());
        let content = fs::read_to_string(&path).map_err(|e| ScriptError::Artifact(e.to_string()))?;
        Artifact::from_json(&content)
    }

    /// Find the unique artifact file of `contract_name`
    pub fn artifact_path(&self, contract_name: &str) -> Result<PathBuf, ScriptError> {
        if !self.root.is_dir() {
            return Err(ScriptError::Artifact(format!(
                "artifacts directory {} not found, compile the contracts first",
                self.root.display()
            )));
        }

        let file_name = format!("{contract_name}.json");
        let mut found = Vec::new();
        collect_files(&self.root, &file_name, &mut found)?;

        match found.len() {
            0 => Err(ScriptError::Artifact(format!(
                "no artifact for contract {contract_name} in {}",
                self.root.display()
            ))),
            1 => Ok(found.remove(0)),
            _ => {
                let candidates = found
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(ScriptError::Artifact(format!(
                    "multiple artifacts for contract {contract_name}: {candidates}"
                )))
            }
        }
    }

    /// Store an artifact under its source name
    pub fn write(&self, artifact: &Artifact) -> Result<PathBuf, ScriptError> {
        let dir = self.root.join(&artifact.source_name);
        fs::create_dir_all(&dir).map_err(|e| ScriptError::Artifact(e.to_string()))?;

        let path = dir.join(format!("{}.json", artifact.contract_name));
        fs::write(&path, json::stringify_pretty(artifact.to_json(), 2))
            .map_err(|e| ScriptError::Artifact(e.to_string()))?;

        Ok(path)
    }
}

/// Recursively collect the files named `file_name` under `dir`
fn collect_files(dir: &Path, file_name: &str, found: &mut Vec<PathBuf>) -> Result<(), ScriptError> {
    let entries = fs::read_dir(dir).map_err(|e| ScriptError::Artifact(e.to_string()))?;
    for entry in entries {
        let path = entry.map_err(|e| ScriptError::Artifact(e.to_string()))?.path();
        if path.is_dir() {
            collect_files(&path, file_name, found)?;
        } else if path.file_name().is_some_and(|name| name == file_name) {
            found.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_fs::{prelude::*, TempDir};

    use super::*;

    fn artifact(bytecode: &str, abi: &str) -> String {
        format!(
            r#"{{
                "_format": "hh-sol-artifact-1",
                "contractName": "Authentico",
                "sourceName": "contracts/Authentico.sol",
                "abi": {abi},
                "bytecode": "{bytecode}",
                "deployedBytecode": "0x6080"
            }}"#
        )
    }

    #[test]
    fn artifact_is_found_by_contract_name() {
        let dir = TempDir::new().unwrap();
        dir.child("contracts/Authentico.sol/Authentico.json")
            .write_str(&artifact("0x6080604052", "[]"))
            .unwrap();
        dir.child("contracts/Authentico.sol/Authentico.dbg.json")
            .write_str("{}")
            .unwrap();

        let registry = ArtifactRegistry::new(dir.path());
        let artifact = registry.artifact("Authentico").unwrap();
        assert_eq!(artifact.contract_name, "Authentico");
        assert_eq!(artifact.source_name, "contracts/Authentico.sol");
        assert_eq!(
            artifact.creation_code().unwrap(),
            Bytes::from(vec![0x60, 0x80, 0x60, 0x40, 0x52])
        );
    }

    #[test]
    fn missing_artifact_is_an_error() {
        let dir = TempDir::new().unwrap();
        let registry = ArtifactRegistry::new(dir.path());
        let err = registry.artifact("Authentico").unwrap_err();
        assert!(err.to_string().contains("no artifact for contract Authentico"));

        let registry = ArtifactRegistry::new(dir.path().join("nope"));
        assert!(registry.artifact("Authentico").is_err());
    }

    #[test]
    fn ambiguous_artifact_is_an_error() {
        let dir = TempDir::new().unwrap();
        dir.child("a.sol/Authentico.json")
            .write_str(&artifact("0x60", "[]"))
            .unwrap();
        dir.child("b.sol/Authentico.json")
            .write_str(&artifact("0x60", "[]"))
            .unwrap();

        let err = ArtifactRegistry::new(dir.path())
            .artifact("Authentico")
            .unwrap_err();
        assert!(err.to_string().contains("multiple artifacts"));
    }

    #[test]
    fn undeployable_bytecode_is_rejected() {
        let empty = Artifact::from_json(&artifact("0x", "[]")).unwrap();
        assert!(empty.creation_code().is_err());

        let unlinked =
            Artifact::from_json(&artifact("0x6080__$1234567890abcdef$__6080", "[]")).unwrap();
        let err = unlinked.creation_code().unwrap_err();
        assert!(err.to_string().contains("unlinked"));
    }

    #[test]
    fn constructor_arguments_are_rejected() {
        let abi = r#"[{"type": "constructor", "inputs": [{"name": "owner", "type": "address"}]}]"#;
        let artifact = Artifact::from_json(&artifact("0x6080", abi)).unwrap();
        assert_eq!(artifact.constructor_inputs(), 1);
        assert!(artifact.creation_code().is_err());
    }

    #[test]
    fn malformed_artifact_is_rejected() {
        assert!(Artifact::from_json("not json").is_err());
        assert!(Artifact::from_json(r#"{"contractName": "Authentico"}"#).is_err());
    }

    #[test]
    fn written_artifact_is_found_again() {
        let dir = TempDir::new().unwrap();
        let registry = ArtifactRegistry::new(dir.path());
        let written = Artifact::from_json(&artifact("0x6080", "[]")).unwrap();

        let path = registry.write(&written).unwrap();
        assert!(path.ends_with("contracts/Authentico.sol/Authentico.json"));
        assert_eq!(registry.artifact("Authentico").unwrap(), written);
    }
}
