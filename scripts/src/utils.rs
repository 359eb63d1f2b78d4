//! Utilities for the deploy scripts.

use std::process::{Command, Stdio};

use tracing::debug;

use crate::errors::ScriptError;

/// Executes a command and captures its standard output, returning an error if the command fails
pub(crate) fn command_output_or(mut cmd: Command, err_msg: &str) -> Result<String, ScriptError> {
    cmd.stderr(Stdio::inherit());
    debug!("Running command: {:?}", cmd);
    let output = cmd
        .output()
        .map_err(|e| ScriptError::ContractCompilation(format!("{err_msg}: {e}")))?;

    if !output.status.success() {
        return Err(ScriptError::ContractCompilation(String::from(err_msg)));
    }

    String::from_utf8(output.stdout).map_err(|e| ScriptError::ContractCompilation(e.to_string()))
}
