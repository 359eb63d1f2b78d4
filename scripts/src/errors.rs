//! Definitions of errors that can occur during the execution of the contract management scripts

use thiserror::Error;

/// Errors that can occur during the execution of the contract management scripts
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Error when loading or resolving the project configuration
    #[error("error in project configuration: {0}")]
    Config(String),
    /// Error when reading or writing the json output file
    #[error("error writing json output: {0}")]
    JsonOutputError(String),
    /// Error when creating the client
    #[error("error during client init: {0}")]
    ClientInitialization(String),
    /// Error when fetching the nonce to deploy a contract
    #[error("error during nonce fetching for client signing: {0}")]
    NonceFetching(String),
    /// Error when looking up a contract artifact
    #[error("error reading contract artifact: {0}")]
    Artifact(String),
    /// Error deploying a contract
    #[error("error deploying contract: {0}")]
    ContractDeployment(String),
    /// Error compiling a contract
    #[error("error compiling contract: {0}")]
    ContractCompilation(String),
    /// Error verifying a contract on the block explorer
    #[error("error verifying contract: {0}")]
    Verification(String),
}
