use std::{fs, path::Path};

use json::JsonValue;

use crate::{config::OptimizerConfig, constants::BUILD_INFO_FILE, errors::ScriptError};

/// How the artifacts of a directory were produced, needed to verify them later
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    /// Full compiler version, `0.8.11+commit.d7f03943`
    pub solc_long_version: String,
    pub optimizer: OptimizerConfig,
    /// Source files handed to the compiler, as named in the artifacts
    pub sources: Vec<String>,
}

impl BuildInfo {
    /// Write the build info into the artifacts directory
    pub fn write(&self, artifacts_dir: &Path) -> Result<(), ScriptError> {
        let mut value = JsonValue::new_object();
        value["solcLongVersion"] = self.solc_long_version.as_str().into();
        value["optimizer"]["enabled"] = self.optimizer.enabled.into();
        value["optimizer"]["runs"] = self.optimizer.runs.into();
        value["sources"] = self.sources.clone().into();

        fs::create_dir_all(artifacts_dir)
            .map_err(|e| ScriptError::ContractCompilation(e.to_string()))?;
        fs::write(
            artifacts_dir.join(BUILD_INFO_FILE),
            json::stringify_pretty(value, 2),
        )
        .map_err(|e| ScriptError::ContractCompilation(e.to_string()))
    }

    /// Read back the build info of an artifacts directory
    pub fn read(artifacts_dir: &Path) -> Result<Self, ScriptError> {
        let path = artifacts_dir.join(BUILD_INFO_FILE);
        let content = fs::read_to_string(&path)
            .map_err(|e| ScriptError::Artifact(format!("{}: {e}", path.display())))?;
        let parsed = json::parse(&content).map_err(|e| ScriptError::Artifact(e.to_string()))?;

        let solc_long_version = parsed["solcLongVersion"]
            .as_str()
            .ok_or_else(|| ScriptError::Artifact(String::from("build info has no compiler version")))?
            .to_string();
        let optimizer = OptimizerConfig {
            enabled: parsed["optimizer"]["enabled"].as_bool().unwrap_or_default(),
            runs: parsed["optimizer"]["runs"]
                .as_u32()
                .unwrap_or(OptimizerConfig::default().runs),
        };

        // Missing from build infos written by older versions of the scripts
        let sources = parsed["sources"]
            .members()
            .filter_map(|source| source.as_str().map(str::to_string))
            .collect();

        Ok(Self {
            solc_long_version,
            optimizer,
            sources,
        })
    }
}
