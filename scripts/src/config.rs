//! Project configuration: compiler, networks, typed bindings and explorer settings.
//!
//! The configuration is plain data. Values are handed back exactly as declared
//! in the TOML file; the only thing filled at load time are the secrets read
//! from the environment (see [`EnvSecrets`]).

use std::{collections::BTreeMap, env, fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    constants::{
        DEFAULT_CONFIG_FILE, DEFAULT_EXPLORER_API, DEFAULT_NETWORK, ETHERSCAN_API_KEY_ENV,
        PRIVATE_KEY_ENV, REMOTE_NETWORK, RPC_URL_ENV, TEST_ACCOUNTS_BALANCE, TEST_ACCOUNTS_COUNT,
        TEST_MNEMONIC,
    },
    errors::ScriptError,
};

/// Placeholder printed instead of secrets
const REDACTED: &str = "<redacted>";

/// The whole project configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Solidity compilers
    pub solidity: SolidityConfig,
    /// Network profiles, by name
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
    /// Typed bindings generation
    pub typechain: TypechainConfig,
    /// Block explorer used for source verification
    #[serde(default)]
    pub etherscan: EtherscanConfig,
}

/// Compilers used to build the contracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolidityConfig {
    pub compilers: Vec<CompilerConfig>,
}

/// A single solc version with its settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    pub version: String,
    #[serde(default)]
    pub settings: CompilerSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerSettings {
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

/// solc optimizer switch and its `runs` parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub enabled: bool,
    pub runs: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        // solc defaults
        Self { enabled: false, runs: 200 }
    }
}

/// Connection parameters of a network.
///
/// A network without `url` is the in-process one: a local node is started
/// for it with the configured accounts. An empty `url` means the network was
/// declared but never configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub accounts: AccountsConfig,
}

impl NetworkConfig {
    /// Whether this network is served by a locally spawned node
    pub fn is_in_process(&self) -> bool {
        self.url.is_none()
    }
}

/// The accounts available on a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountsConfig {
    /// Explicit hex encoded private keys
    Keys(Vec<String>),
    /// Deterministic accounts derived from a mnemonic
    Mnemonic(HdAccountsConfig),
}

impl Default for AccountsConfig {
    fn default() -> Self {
        AccountsConfig::Keys(Vec::new())
    }
}

/// Deterministic account set derived from a mnemonic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HdAccountsConfig {
    pub mnemonic: String,
    #[serde(default = "default_accounts_count")]
    pub count: u32,
    /// Starting balance of every account, in wei
    #[serde(default = "default_accounts_balance")]
    pub accounts_balance: String,
}

impl Default for HdAccountsConfig {
    fn default() -> Self {
        Self {
            mnemonic: TEST_MNEMONIC.to_string(),
            count: default_accounts_count(),
            accounts_balance: default_accounts_balance(),
        }
    }
}

fn default_accounts_count() -> u32 {
    TEST_ACCOUNTS_COUNT
}

fn default_accounts_balance() -> String {
    TEST_ACCOUNTS_BALANCE.to_string()
}

/// Typed bindings generation target. Carried for the bindings generator, never
/// interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypechainConfig {
    pub target: String,
    #[serde(default)]
    pub always_generate_overloads: bool,
}

/// Etherscan compatible explorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtherscanConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_explorer_api")]
    pub api_url: String,
}

impl Default for EtherscanConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_explorer_api(),
        }
    }
}

fn default_explorer_api() -> String {
    DEFAULT_EXPLORER_API.to_string()
}

/// Secrets read from the environment at process start, without validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSecrets {
    pub private_key: Option<String>,
    pub rpc_url: Option<String>,
    pub etherscan_api_key: Option<String>,
}

impl EnvSecrets {
    /// Read the secrets from the process environment
    pub fn from_env() -> Self {
        Self {
            private_key: env::var(PRIVATE_KEY_ENV).ok(),
            rpc_url: env::var(RPC_URL_ENV).ok(),
            etherscan_api_key: env::var(ETHERSCAN_API_KEY_ENV).ok(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        let mut networks = BTreeMap::new();
        networks.insert(
            DEFAULT_NETWORK.to_string(),
            NetworkConfig {
                url: None,
                chain_id: None,
                accounts: AccountsConfig::Mnemonic(HdAccountsConfig::default()),
            },
        );
        networks.insert(
            REMOTE_NETWORK.to_string(),
            NetworkConfig {
                url: Some(String::new()),
                chain_id: None,
                accounts: AccountsConfig::Keys(Vec::new()),
            },
        );

        Self {
            solidity: SolidityConfig {
                compilers: vec![CompilerConfig {
                    version: "0.8.11".to_string(),
                    settings: CompilerSettings {
                        optimizer: OptimizerConfig {
                            enabled: true,
                            runs: 10000,
                        },
                    },
                }],
            },
            networks,
            typechain: TypechainConfig {
                target: "truffle-v5".to_string(),
                always_generate_overloads: false,
            },
            etherscan: EtherscanConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Parse a configuration from its TOML representation
    pub fn from_toml_str(content: &str) -> Result<Self, ScriptError> {
        toml::from_str(content).map_err(|e| ScriptError::Config(e.to_string()))
    }

    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, `deploy.toml` from the
    /// working directory is used if present, otherwise the built-in defaults.
    pub fn load(path: Option<&Path>, secrets: &EnvSecrets) -> Result<Self, ScriptError> {
        let config = match path {
            Some(path) => Self::read(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::read(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                info!("No config file found, using the default configuration");
                Self::default()
            }
        };

        Ok(config.with_secrets(secrets))
    }

    /// Read and parse a config file
    fn read(path: &Path) -> Result<Self, ScriptError> {
        info!("Loading config from {}", path.display());
        let content = fs::read_to_string(path)
            .map_err(|e| ScriptError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Fill the remote network profile and the explorer key from the environment.
    ///
    /// Only empty values are filled, anything declared in the file wins.
    pub fn with_secrets(mut self, secrets: &EnvSecrets) -> Self {
        if let Some(remote) = self.networks.get_mut(REMOTE_NETWORK) {
            if remote.url.as_deref() == Some("") {
                if let Some(rpc_url) = &secrets.rpc_url {
                    debug!("Using {RPC_URL_ENV} for the {REMOTE_NETWORK} network");
                    remote.url = Some(rpc_url.clone());
                }
            }
            if matches!(&remote.accounts, AccountsConfig::Keys(keys) if keys.is_empty()) {
                if let Some(private_key) = &secrets.private_key {
                    remote.accounts = AccountsConfig::Keys(vec![private_key.clone()]);
                }
            }
        }

        if self.etherscan.api_key.is_none() {
            self.etherscan.api_key = secrets.etherscan_api_key.clone();
        }

        self
    }

    /// Compiler used to build the contracts (the first one declared)
    pub fn compiler(&self) -> Result<&CompilerConfig, ScriptError> {
        self.solidity
            .compilers
            .first()
            .ok_or_else(|| ScriptError::Config(String::from("no solidity compiler configured")))
    }

    /// Look up a network profile by name
    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ScriptError> {
        self.networks.get(name).ok_or_else(|| {
            let known = self.networks.keys().cloned().collect::<Vec<_>>().join(", ");
            ScriptError::Config(format!("unknown network '{name}', available: {known}"))
        })
    }

    /// Copy of the configuration with every secret masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for network in config.networks.values_mut() {
            match &mut network.accounts {
                AccountsConfig::Keys(keys) => keys.iter_mut().for_each(|key| *key = REDACTED.into()),
                AccountsConfig::Mnemonic(hd) => hd.mnemonic = REDACTED.into(),
            }
        }
        if config.etherscan.api_key.is_some() {
            config.etherscan.api_key = Some(REDACTED.into());
        }
        config
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ScriptError> {
        toml::to_string_pretty(self).map_err(|e| ScriptError::Config(e.to_string()))
    }
}
