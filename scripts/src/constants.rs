//! Constants used in the deploy scripts

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "deploy.toml";

/// Name of the network used when none is given
pub const DEFAULT_NETWORK: &str = "hardhat";

/// Name of the remote network profile filled from the environment
pub const REMOTE_NETWORK: &str = "testnet";

/// The contract deployed by default
pub const DEFAULT_CONTRACT: &str = "Authentico";

/// Default solidity sources directory
pub const DEFAULT_SOURCES_DIR: &str = "contracts";

/// Default artifacts directory
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// File in which deployed addresses are recorded
pub const DEPLOYED_FILE: &str = "deployed.json";

/// Name of the build info file written next to the artifacts
pub const BUILD_INFO_FILE: &str = "build-info.json";

/// Format tag of the artifacts we write and read
pub const ARTIFACT_FORMAT: &str = "hh-sol-artifact-1";

/// Default explorer API endpoint
pub const DEFAULT_EXPLORER_API: &str = "https://api.etherscan.io/api";

/// Mnemonic of the deterministic test accounts
pub const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";

/// Number of deterministic test accounts
pub const TEST_ACCOUNTS_COUNT: u32 = 10;

/// Starting balance of each test account, in wei
pub const TEST_ACCOUNTS_BALANCE: &str = "100000000000000000000000000";

/// Env var holding the deployer private key
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Env var holding the remote network RPC url
pub const RPC_URL_ENV: &str = "RPC_URL";

/// Env var holding the explorer API key
pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";
