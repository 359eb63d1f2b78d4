use std::{fmt::LowerHex, fs, path::Path};

use json::JsonValue;

use crate::errors::ScriptError;

/// Entries recorded for a deployed contract, per network
pub enum OutputKeys<'a> {
    // Address the contract was deployed at
    Address { network: &'a str, contract: &'a str },
    // Hash of the creation transaction
    DeployTx { network: &'a str, contract: &'a str },
}

impl OutputKeys<'_> {
    /// Path of the entry inside the output document
    fn path(&self) -> (&str, &str, &'static str) {
        match self {
            OutputKeys::Address { network, contract } => (*network, *contract, "address"),
            OutputKeys::DeployTx { network, contract } => (*network, *contract, "tx"),
        }
    }
}

/// Read an entry of the output file
pub fn read_output_file(file_path: &Path, key: OutputKeys) -> Result<String, ScriptError> {
    if !file_path.exists() {
        return Err(ScriptError::JsonOutputError(format!(
            "{} not found",
            file_path.display()
        )));
    }

    // Parse it's json content into objects
    let parsed_json = get_json_from_file(file_path)?;
    let (network, contract, field) = key.path();

    parsed_json[network][contract][field]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            ScriptError::JsonOutputError(format!(
                "no {field} recorded for {contract} on {network}"
            ))
        })
}

/// Create the output file when absent, or make sure the existing one can be updated
pub fn ensure_output_file(file_path: &Path) -> Result<(), ScriptError> {
    if !file_path.exists() {
        return fs::write(file_path, "{}").map_err(|e| {
            ScriptError::JsonOutputError(format!("{}: {e}", file_path.display()))
        });
    }

    let parsed_json = get_json_from_file(file_path)?;
    if !parsed_json.is_object() {
        return Err(ScriptError::JsonOutputError(format!(
            "{} is not a json object",
            file_path.display()
        )));
    }

    // Open for writing without touching the content
    fs::OpenOptions::new()
        .append(true)
        .open(file_path)
        .map_err(|e| ScriptError::JsonOutputError(format!("{}: {e}", file_path.display())))?;

    Ok(())
}

/// Writes the given value for a deployed contract
pub fn write_output_file<T: LowerHex>(
    file_path: &Path,
    key: OutputKeys,
    value: T,
) -> Result<(), ScriptError> {
    // If the file doesn't exist, create it
    if !file_path.exists() {
        fs::write(file_path, "{}").map_err(|e| ScriptError::JsonOutputError(e.to_string()))?;
    }

    // Parse it's json content into objects
    let mut parsed_json = get_json_from_file(file_path)?;

    // Update the right key
    let (network, contract, field) = key.path();
    parsed_json[network][contract][field] = JsonValue::String(format!("{value:#x}"));

    // Write the updated json back to the file
    fs::write(file_path, json::stringify_pretty(parsed_json, 4))
        .map_err(|e| ScriptError::JsonOutputError(e.to_string()))?;

    Ok(())
}

/// Parses the JSON file at the given path
fn get_json_from_file(file_path: &Path) -> Result<JsonValue, ScriptError> {
    let file_contents =
        fs::read_to_string(file_path).map_err(|e| ScriptError::JsonOutputError(e.to_string()))?;

    json::parse(&file_contents)
        .map_err(|e| ScriptError::JsonOutputError(format!("{}: {e}", file_path.display())))
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, b256};
    use assert_fs::{prelude::*, TempDir};

    use super::*;

    #[test]
    fn entries_are_kept_per_network_and_contract() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("deployed.json");

        let local = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
        let remote = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");
        let tx = b256!("0101010101010101010101010101010101010101010101010101010101010101");

        let local_key = || OutputKeys::Address {
            network: "hardhat",
            contract: "Authentico",
        };
        write_output_file(file.path(), local_key(), local).unwrap();
        write_output_file(
            file.path(),
            OutputKeys::Address {
                network: "testnet",
                contract: "Authentico",
            },
            remote,
        )
        .unwrap();
        write_output_file(
            file.path(),
            OutputKeys::DeployTx {
                network: "hardhat",
                contract: "Authentico",
            },
            tx,
        )
        .unwrap();

        assert_eq!(
            read_output_file(file.path(), local_key()).unwrap(),
            "0x5fbdb2315678afecb367f032d93f642f64180aa3"
        );
        let remote_read = read_output_file(
            file.path(),
            OutputKeys::Address {
                network: "testnet",
                contract: "Authentico",
            },
        )
        .unwrap();
        assert_eq!(remote_read.parse::<alloy::primitives::Address>().unwrap(), remote);
        assert_eq!(
            read_output_file(
                file.path(),
                OutputKeys::DeployTx {
                    network: "hardhat",
                    contract: "Authentico",
                },
            )
            .unwrap(),
            format!("{tx:#x}")
        );
    }

    #[test]
    fn missing_file_or_entry_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("deployed.json");
        let key = || OutputKeys::Address {
            network: "hardhat",
            contract: "Authentico",
        };
        assert!(read_output_file(file.path(), key()).is_err());

        file.write_str("{}").unwrap();
        let err = read_output_file(file.path(), key()).unwrap_err();
        assert!(err.to_string().contains("no address recorded for Authentico on hardhat"));
    }

    #[test]
    fn output_file_is_checked_before_use() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("deployed.json");

        ensure_output_file(file.path()).unwrap();
        file.assert("{}");

        file.write_str(r#"{"hardhat":{}}"#).unwrap();
        ensure_output_file(file.path()).unwrap();
        file.assert(r#"{"hardhat":{}}"#);

        file.write_str("{ not json").unwrap();
        assert!(matches!(
            ensure_output_file(file.path()),
            Err(ScriptError::JsonOutputError(_))
        ));

        file.write_str("[]").unwrap();
        assert!(ensure_output_file(file.path()).is_err());

        let missing_dir = dir.path().join("missing").join("deployed.json");
        assert!(ensure_output_file(&missing_dir).is_err());
    }
}
