use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::info;

use crate::{
    artifacts::{Artifact, ArtifactRegistry},
    build::info::BuildInfo,
    config::CompilerConfig,
    errors::ScriptError,
    utils::command_output_or,
};

/// Version reported by a solc binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolcVersion {
    /// Semver part, `0.8.11`
    pub version: String,
    /// Semver with commit, `0.8.11+commit.d7f03943`
    pub long_version: String,
}

/// Compiles the solidity sources with the configured solc version
pub struct SolcBuilder<'a> {
    compiler: &'a CompilerConfig,
    solc: PathBuf,
}

impl<'a> SolcBuilder<'a> {
    /// Builder using the `solc` binary found in `PATH`
    pub fn new(compiler: &'a CompilerConfig) -> Self {
        Self::with_binary(compiler, "solc")
    }

    /// Builder using a specific solc binary
    pub fn with_binary(compiler: &'a CompilerConfig, solc: impl Into<PathBuf>) -> Self {
        Self {
            compiler,
            solc: solc.into(),
        }
    }

    /// Full build of every source under `sources_dir` into the registry
    pub fn build(
        &self,
        sources_dir: &Path,
        registry: &ArtifactRegistry,
    ) -> Result<Vec<PathBuf>, ScriptError> {
        // Make sure we run the configured compiler
        let version = self.check_version()?;
        info!("Compiling with solc {}", version.long_version);

        let sources = collect_sources(sources_dir)?;
        info!("Compiling {} source files", sources.len());

        let output = self.compile(&sources)?;
        let artifacts = parse_combined_json(&output)?;

        let mut written = Vec::with_capacity(artifacts.len());
        for artifact in &artifacts {
            written.push(registry.write(artifact)?);
        }

        BuildInfo {
            solc_long_version: version.long_version,
            optimizer: self.compiler.settings.optimizer.clone(),
            sources: sources.iter().map(|path| path.display().to_string()).collect(),
        }
        .write(registry.root())?;

        info!("Wrote {} artifacts to {}", written.len(), registry.root().display());
        Ok(written)
    }

    /// Check the solc binary matches the configured version
    fn check_version(&self) -> Result<SolcVersion, ScriptError> {
        let mut version_cmd = Command::new(&self.solc);
        version_cmd.arg("--version");
        let output = command_output_or(version_cmd, "Failed to run solc")?;

        let version = parse_solc_version(&output)?;
        if version.version != self.compiler.version {
            return Err(ScriptError::ContractCompilation(format!(
                "solc {} found but {} is configured",
                version.version, self.compiler.version
            )));
        }

        Ok(version)
    }

    /// Run solc over the sources, returning its combined json output
    fn compile(&self, sources: &[PathBuf]) -> Result<String, ScriptError> {
        let mut build_cmd = Command::new(&self.solc);
        build_cmd.args(["--combined-json", "abi,bin,bin-runtime"]);

        let optimizer = &self.compiler.settings.optimizer;
        if optimizer.enabled {
            build_cmd.arg("--optimize");
            build_cmd.arg("--optimize-runs");
            build_cmd.arg(optimizer.runs.to_string());
        }
        build_cmd.args(sources);

        command_output_or(build_cmd, "Failed to compile contracts")
    }
}

/// Extract the version from `solc --version` output
pub fn parse_solc_version(output: &str) -> Result<SolcVersion, ScriptError> {
    let raw = output
        .lines()
        .find_map(|line| line.trim().strip_prefix("Version:"))
        .map(str::trim)
        .ok_or_else(|| ScriptError::ContractCompilation(String::from("unrecognized solc version output")))?;

    // `0.8.11+commit.d7f03943.Linux.g++`: drop the platform suffix
    let (version, build) = raw.split_once('+').unwrap_or((raw, ""));
    let commit = build
        .strip_prefix("commit.")
        .map(|rest| rest.split('.').next().unwrap_or_default())
        .filter(|commit| !commit.is_empty());

    let long_version = match commit {
        Some(commit) => format!("{version}+commit.{commit}"),
        None => version.to_string(),
    };

    Ok(SolcVersion {
        version: version.to_string(),
        long_version,
    })
}

/// Turn solc `--combined-json` output into artifacts
pub fn parse_combined_json(output: &str) -> Result<Vec<Artifact>, ScriptError> {
    let parsed =
        json::parse(output).map_err(|e| ScriptError::ContractCompilation(e.to_string()))?;

    let mut artifacts = Vec::new();
    for (key, contract) in parsed["contracts"].entries() {
        let (source_name, contract_name) = key.rsplit_once(':').ok_or_else(|| {
            ScriptError::ContractCompilation(format!("unexpected contract key {key}"))
        })?;

        // Older compilers emit the abi as an encoded string
        let abi = match contract["abi"].as_str() {
            Some(encoded) => json::parse(encoded)
                .map_err(|e| ScriptError::ContractCompilation(e.to_string()))?,
            None => contract["abi"].clone(),
        };

        artifacts.push(Artifact {
            contract_name: contract_name.to_string(),
            source_name: source_name.to_string(),
            abi,
            bytecode: format!("0x{}", contract["bin"].as_str().unwrap_or_default()),
            deployed_bytecode: format!("0x{}", contract["bin-runtime"].as_str().unwrap_or_default()),
        });
    }

    if artifacts.is_empty() {
        return Err(ScriptError::ContractCompilation(String::from(
            "compiler produced no contracts",
        )));
    }

    Ok(artifacts)
}

/// Every `.sol` file under `dir`, sorted
fn collect_sources(dir: &Path) -> Result<Vec<PathBuf>, ScriptError> {
    let mut sources = Vec::new();
    collect_sources_into(dir, &mut sources)?;
    sources.sort();

    if sources.is_empty() {
        return Err(ScriptError::ContractCompilation(format!(
            "no solidity sources found in {}",
            dir.display()
        )));
    }

    Ok(sources)
}

fn collect_sources_into(dir: &Path, sources: &mut Vec<PathBuf>) -> Result<(), ScriptError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| ScriptError::ContractCompilation(format!("{}: {e}", dir.display())))?;
    for entry in entries {
        let path = entry
            .map_err(|e| ScriptError::ContractCompilation(e.to_string()))?
            .path();
        if path.is_dir() {
            collect_sources_into(&path, sources)?;
        } else if path.extension().is_some_and(|ext| ext == "sol") {
            sources.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_fs::{prelude::*, TempDir};

    use super::*;
    use crate::config::{CompilerSettings, OptimizerConfig};

    #[test]
    fn solc_version_output_is_parsed() {
        let output = "solc, the solidity compiler commandline interface\n\
                      Version: 0.8.11+commit.d7f03943.Linux.g++\n";
        let version = parse_solc_version(output).unwrap();
        assert_eq!(version.version, "0.8.11");
        assert_eq!(version.long_version, "0.8.11+commit.d7f03943");

        assert!(parse_solc_version("something else").is_err());
    }

    #[test]
    fn combined_json_becomes_artifacts() {
        let output = r#"{
            "contracts": {
                "contracts/Authentico.sol:Authentico": {
                    "abi": [{"type": "function", "name": "owner", "inputs": [], "outputs": []}],
                    "bin": "6080604052",
                    "bin-runtime": "6080"
                },
                "contracts/Lib.sol:Strings": {
                    "abi": "[]",
                    "bin": "60",
                    "bin-runtime": "60"
                }
            },
            "version": "0.8.11+commit.d7f03943.Linux.g++"
        }"#;

        let artifacts = parse_combined_json(output).unwrap();
        assert_eq!(artifacts.len(), 2);

        let authentico = &artifacts[0];
        assert_eq!(authentico.contract_name, "Authentico");
        assert_eq!(authentico.source_name, "contracts/Authentico.sol");
        assert_eq!(authentico.bytecode, "0x6080604052");
        assert_eq!(authentico.deployed_bytecode, "0x6080");
        assert_eq!(authentico.abi.len(), 1);

        let strings = &artifacts[1];
        assert!(strings.abi.is_array());
        assert_eq!(strings.abi.len(), 0);
    }

    #[test]
    fn empty_compiler_output_is_an_error() {
        assert!(parse_combined_json(r#"{"contracts": {}}"#).is_err());
        assert!(parse_combined_json("garbage").is_err());
    }

    #[test]
    fn sources_are_collected_recursively() {
        let dir = TempDir::new().unwrap();
        dir.child("Authentico.sol").touch().unwrap();
        dir.child("lib/Strings.sol").touch().unwrap();
        dir.child("README.md").touch().unwrap();

        let sources = collect_sources(dir.path()).unwrap();
        assert_eq!(sources.len(), 2);
        assert!(sources.iter().all(|path| path.extension().unwrap() == "sol"));

        let empty = TempDir::new().unwrap();
        assert!(collect_sources(empty.path()).is_err());
    }

    #[test]
    fn missing_solc_binary_is_an_error() {
        let compiler = CompilerConfig {
            version: "0.8.11".to_string(),
            settings: CompilerSettings {
                optimizer: OptimizerConfig::default(),
            },
        };
        let dir = TempDir::new().unwrap();
        dir.child("Authentico.sol").touch().unwrap();

        let builder = SolcBuilder::with_binary(&compiler, dir.path().join("no-solc"));
        let registry = ArtifactRegistry::new(dir.path().join("artifacts"));
        let err = builder.build(dir.path(), &registry).unwrap_err();
        assert!(matches!(err, ScriptError::ContractCompilation(_)));
    }

    /// Shell script standing in for a solc 0.8.10 binary
    #[cfg(unix)]
    fn fake_solc(dir: &TempDir) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.child("solc");
        script
            .write_str(
                r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "solc, the solidity compiler commandline interface"
    echo "Version: 0.8.10+commit.fc410830.Linux.g++"
    exit 0
fi
echo "$@" > "$(dirname "$0")/args"
echo '{"contracts":{"contracts/Authentico.sol:Authentico":{"abi":[],"bin":"6080604052","bin-runtime":"6080"}},"version":"0.8.10+commit.fc410830.Linux.g++"}'
"#,
            )
            .unwrap();
        fs::set_permissions(script.path(), fs::Permissions::from_mode(0o755)).unwrap();
        script.path().to_path_buf()
    }

    fn compiler(version: &str) -> CompilerConfig {
        CompilerConfig {
            version: version.to_string(),
            settings: CompilerSettings {
                optimizer: OptimizerConfig {
                    enabled: true,
                    runs: 200,
                },
            },
        }
    }

    #[cfg(unix)]
    #[test]
    fn solc_version_mismatch_is_an_error() {
        let bin = TempDir::new().unwrap();
        let solc = fake_solc(&bin);
        let project = TempDir::new().unwrap();
        project.child("contracts/Authentico.sol").touch().unwrap();

        let compiler = compiler("0.8.11");
        let registry = ArtifactRegistry::new(project.path().join("artifacts"));
        let err = SolcBuilder::with_binary(&compiler, &solc)
            .build(&project.path().join("contracts"), &registry)
            .unwrap_err();

        assert!(matches!(err, ScriptError::ContractCompilation(_)));
        assert_eq!(
            err.to_string(),
            "error compiling contract: solc 0.8.10 found but 0.8.11 is configured"
        );
        // Nothing compiled
        assert!(!bin.path().join("args").exists());
        assert!(!project.path().join("artifacts").exists());
    }

    #[cfg(unix)]
    #[test]
    fn matching_solc_writes_artifacts_and_build_info() {
        let bin = TempDir::new().unwrap();
        let solc = fake_solc(&bin);
        let project = TempDir::new().unwrap();
        project.child("contracts/Authentico.sol").touch().unwrap();

        let compiler = compiler("0.8.10");
        let registry = ArtifactRegistry::new(project.path().join("artifacts"));
        let written = SolcBuilder::with_binary(&compiler, &solc)
            .build(&project.path().join("contracts"), &registry)
            .unwrap();
        assert_eq!(written.len(), 1);

        let args = fs::read_to_string(bin.path().join("args")).unwrap();
        assert!(args.starts_with("--combined-json abi,bin,bin-runtime --optimize --optimize-runs 200 "));

        let artifact = registry.artifact("Authentico").unwrap();
        assert_eq!(artifact.bytecode, "0x6080604052");

        let info = BuildInfo::read(registry.root()).unwrap();
        assert_eq!(info.solc_long_version, "0.8.10+commit.fc410830");
        assert_eq!(info.optimizer.runs, 200);
        assert_eq!(info.sources.len(), 1);
        assert!(info.sources[0].ends_with("Authentico.sol"));
    }
}
