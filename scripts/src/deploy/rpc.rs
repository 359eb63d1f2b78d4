use alloy::{
    network::TransactionBuilder,
    primitives::{Address, TxHash},
    providers::Provider,
    rpc::types::eth::TransactionRequest,
};
use tracing::{info, warn};

use crate::{
    artifacts::Artifact,
    deploy::{ContractFactory, Deployment},
    errors::ScriptError,
    tx::client::{Connection, RpcProvider},
};

/// Creates contracts by sending a creation transaction from the connection's deployer
pub struct RpcFactory<'a> {
    connection: &'a Connection,
}

impl<'a> RpcFactory<'a> {
    pub fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }
}

impl ContractFactory for RpcFactory<'_> {
    async fn deploy(&self, artifact: &Artifact) -> Result<Deployment, ScriptError> {
        let code = artifact.creation_code()?;
        let client = &self.connection.client;
        let deployer = self.connection.deployer;

        // Predict the contract address
        let predicted = predict_contract_address(client, deployer).await?;
        info!("Expected {} address: {}", artifact.contract_name, predicted);

        // Build the tx
        let tx_request = TransactionRequest::default()
            .with_from(deployer)
            .with_deploy_code(code);

        // Send it
        let pending_tx = client
            .send_transaction(tx_request)
            .await
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;
        info!("Pending deploy transaction... {}", pending_tx.tx_hash());

        // Wait for the transaction to be included.
        let receipt = pending_tx
            .get_receipt()
            .await
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

        let address = deployed_address(
            receipt.status(),
            receipt.contract_address,
            receipt.transaction_hash,
            predicted,
        )?;

        if let Some(block) = receipt.block_number {
            info!("Deploy tx done on block: {}", block);
        }

        Ok(Deployment {
            contract_name: artifact.contract_name.clone(),
            address,
            tx_hash: receipt.transaction_hash,
        })
    }
}

/// Address of the contract created by a mined transaction, from its receipt fields
fn deployed_address(
    status: bool,
    contract_address: Option<Address>,
    tx_hash: TxHash,
    predicted: Address,
) -> Result<Address, ScriptError> {
    if !status {
        return Err(ScriptError::ContractDeployment(format!(
            "creation transaction {tx_hash} reverted"
        )));
    }

    let address = contract_address.ok_or_else(|| {
        ScriptError::ContractDeployment(format!("receipt of {tx_hash} has no contract address"))
    })?;
    if address != predicted {
        warn!("Contract landed at {address} instead of {predicted}");
    }

    Ok(address)
}

/// Predict the address of the next contract created by `deployer`
pub async fn predict_contract_address(
    client: &RpcProvider,
    deployer: Address,
) -> Result<Address, ScriptError> {
    // Get the signer nonce
    let nonce = client
        .get_transaction_count(deployer)
        .await
        .map_err(|e| ScriptError::NonceFetching(e.to_string()))?;

    Ok(deployer.create(nonce))
}
