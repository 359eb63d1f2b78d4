//! Definitions of CLI arguments and commands for deploy scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::{
    commands::{compile_contracts, deploy_contracts, list_accounts, show_config, verify_contract, Context},
    config::{AccountsConfig, EnvSecrets, ProjectConfig},
    constants::{DEFAULT_ARTIFACTS_DIR, DEFAULT_CONTRACT, DEFAULT_NETWORK, DEFAULT_SOURCES_DIR, DEPLOYED_FILE},
    errors::ScriptError,
};

/// Scripts for compiling, deploying & verifying the Authentico contract
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Project config file, `deploy.toml` from the working directory when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Network to run against
    #[arg(short, long, global = true, default_value = DEFAULT_NETWORK)]
    pub network: String,

    /// Private key of the deployer, replaces the network accounts
    #[arg(short, long, global = true)]
    pub priv_key: Option<String>,

    /// Network RPC URL, replaces the network url
    #[arg(short, long, global = true)]
    pub rpc_url: Option<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Load the configuration and apply the command line overrides
    pub fn context(&self, secrets: &EnvSecrets) -> Result<Context, ScriptError> {
        let mut config = ProjectConfig::load(self.config.as_deref(), secrets)?;

        if self.priv_key.is_some() || self.rpc_url.is_some() {
            // Validates the network name
            config.network(&self.network)?;
            let network = config.networks.entry(self.network.clone()).or_default();
            if let Some(rpc_url) = &self.rpc_url {
                network.url = Some(rpc_url.clone());
            }
            if let Some(priv_key) = &self.priv_key {
                network.accounts = AccountsConfig::Keys(vec![priv_key.clone()]);
            }
        }

        Ok(Context {
            config,
            network_name: self.network.clone(),
        })
    }
}

/// The possible CLI commands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy a compiled contract
    Deploy(DeployArgs),
    /// Compile the solidity sources into artifacts
    Compile(CompileArgs),
    /// List the accounts of the network
    Accounts,
    /// Verify a deployed contract on the block explorer
    Verify(VerifyArgs),
    /// Print the resolved configuration, secrets hidden
    Config,
}

impl Command {
    /// Run the command
    pub async fn run(self, context: Context) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => {
                info!("Deploying {} on {}...", args.contract, context.network_name);
                deploy_contracts(args, &context).await?;
            }
            Command::Compile(args) => {
                info!("Compiling contracts...");
                compile_contracts(args, &context)?;
            }
            Command::Accounts => list_accounts(&context)?,
            Command::Verify(args) => {
                info!("Verifying {} on {}...", args.contract, context.network_name);
                verify_contract(args, &context).await?;
            }
            Command::Config => show_config(&context)?,
        }

        Ok(())
    }
}

/// Deploy a contract
#[derive(Args)]
pub struct DeployArgs {
    /// Name of the contract to deploy
    #[arg(long, default_value = DEFAULT_CONTRACT)]
    pub contract: String,
    /// Artifacts directory
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,
    /// File in which the deployed address is recorded
    #[arg(long, default_value = DEPLOYED_FILE)]
    pub output: PathBuf,
}

/// Compile the contracts
#[derive(Args)]
pub struct CompileArgs {
    /// Solidity sources directory
    #[arg(long, default_value = DEFAULT_SOURCES_DIR)]
    pub sources: PathBuf,
    /// Artifacts directory
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,
    /// solc binary to use, the one in `PATH` when omitted
    #[arg(long)]
    pub solc: Option<PathBuf>,
}

/// Verify a contract
#[derive(Args)]
pub struct VerifyArgs {
    /// Name of the contract to verify
    #[arg(long, default_value = DEFAULT_CONTRACT)]
    pub contract: String,
    /// Address of the contract, read from the deployment record when omitted
    #[arg(long)]
    pub address: Option<String>,
    /// Artifacts directory
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,
    /// Deployment record
    #[arg(long, default_value = DEPLOYED_FILE)]
    pub output: PathBuf,
}
