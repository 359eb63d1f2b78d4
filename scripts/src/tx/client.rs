use alloy::{
    network::{Ethereum, EthereumWallet},
    node_bindings::{Anvil, AnvilInstance},
    primitives::Address,
    providers::{
        fillers::{ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller},
        Identity, Provider, ProviderBuilder, ReqwestProvider,
    },
};
use reqwest::{Client, Url};
use tracing::{info, warn};

use crate::{
    config::{AccountsConfig, HdAccountsConfig, NetworkConfig},
    errors::ScriptError,
    tx::accounts::{balance_in_ether, deployer_signer},
};

/// Re-export from alloy recommend filter
type RecommendFiller =
    JoinFill<JoinFill<JoinFill<Identity, GasFiller>, NonceFiller>, ChainIdFiller>;

/// An alloy provider that uses the deployer `PrivateKeySigner` to generate signatures
/// & interfaces with the RPC endpoint over HTTP
pub type RpcProvider = FillProvider<
    JoinFill<RecommendFiller, WalletFiller<EthereumWallet>>,
    ReqwestProvider,
    alloy::transports::http::Http<Client>,
    Ethereum,
>;

/// A live connection to a network
pub struct Connection {
    /// Signing provider
    pub client: RpcProvider,
    /// Address of the account sending our transactions
    pub deployer: Address,
    /// Chain id reported by the node
    pub chain_id: u64,
    /// Local node backing the in-process network, killed on drop
    _node: Option<AnvilInstance>,
}

/// Build the signing client for the network `name`.
///
/// The in-process network gets a fresh local node seeded with its accounts.
pub async fn connect(name: &str, network: &NetworkConfig) -> Result<Connection, ScriptError> {
    let signer = deployer_signer(&network.accounts)?;
    let deployer = signer.address();

    let (url, node) = if network.is_in_process() {
        let node = spawn_local_node(network)?;
        info!("Started local node for {} at {}", name, node.endpoint());
        (node.endpoint_url(), Some(node))
    } else {
        (remote_url(name, network)?, None)
    };

    let wallet = EthereumWallet::from(signer);

    // Create our provider with the rpc client + signer
    let client = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(wallet)
        .on_http(url);

    // Fetch chain id
    let chain_id = client
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    if let Some(expected) = network.chain_id {
        if expected != chain_id {
            return Err(ScriptError::ClientInitialization(format!(
                "network {name} expects chain id {expected} but the node reports {chain_id}"
            )));
        }
    }

    info!("Build client on chain ID: {}", chain_id);

    Ok(Connection {
        client,
        deployer,
        chain_id,
        _node: node,
    })
}

/// URL of a remote network, which must be configured and well formed
fn remote_url(name: &str, network: &NetworkConfig) -> Result<Url, ScriptError> {
    let url = network.url.as_deref().unwrap_or_default().trim();
    if url.is_empty() {
        return Err(ScriptError::Config(format!("network {name} has no RPC url configured")));
    }

    url.parse::<Url>()
        .map_err(|e| ScriptError::Config(format!("invalid RPC url for network {name}: {e}")))
}

/// Start an anvil node with the network accounts
fn spawn_local_node(network: &NetworkConfig) -> Result<AnvilInstance, ScriptError> {
    let mut anvil = Anvil::new();
    if let Some(chain_id) = network.chain_id {
        anvil = anvil.chain_id(chain_id);
    }

    match &network.accounts {
        AccountsConfig::Mnemonic(hd) => {
            anvil = anvil.mnemonic(hd.mnemonic.clone()).args(local_node_args(hd)?);
        }
        AccountsConfig::Keys(_) => {
            warn!("Local node started with explicit keys, they will not be funded");
        }
    }

    anvil
        .try_spawn()
        .map_err(|e| ScriptError::ClientInitialization(format!("failed to start local node: {e}")))
}

/// Account count and funding of the local node
fn local_node_args(hd: &HdAccountsConfig) -> Result<Vec<String>, ScriptError> {
    Ok(vec![
        "--accounts".to_string(),
        hd.count.to_string(),
        "--balance".to_string(),
        balance_in_ether(hd)?.to_string(),
    ])
}
