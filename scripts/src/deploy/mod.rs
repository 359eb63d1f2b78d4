//! Contract creation: the factory seam and its RPC implementation.

use std::future::Future;

use alloy::primitives::{Address, TxHash};

use crate::{artifacts::Artifact, errors::ScriptError};

mod rpc;

pub use rpc::{predict_contract_address, RpcFactory};

/// Outcome of a successful contract creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub contract_name: String,
    pub address: Address,
    pub tx_hash: TxHash,
}

/// Something able to create a contract from its artifact
pub trait ContractFactory {
    /// Create one instance of the artifact's contract, without constructor arguments
    fn deploy(&self, artifact: &Artifact) -> impl Future<Output = Result<Deployment, ScriptError>>;
}
