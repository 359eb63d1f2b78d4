use std::{collections::BTreeMap, fs, path::Path};

use alloy::primitives::Address;
use tracing::{error, info};

use crate::{
    artifacts::ArtifactRegistry,
    build::{BuildInfo, SolcBuilder},
    cli::{CompileArgs, DeployArgs, VerifyArgs},
    config::{NetworkConfig, ProjectConfig},
    deploy::{ContractFactory, Deployment, RpcFactory},
    errors::ScriptError,
    output_writer::{ensure_output_file, read_output_file, write_output_file, OutputKeys},
    tx::{accounts::addresses, client::connect},
    verify::{ExplorerClient, VerificationRequest},
};

/// Resolved configuration and selected network shared by every command
pub struct Context {
    pub config: ProjectConfig,
    pub network_name: String,
}

impl Context {
    /// Parameters of the selected network
    pub fn network(&self) -> Result<&NetworkConfig, ScriptError> {
        self.config.network(&self.network_name)
    }
}

/// Deploy a contract from its artifact on the selected network
pub async fn deploy_contracts(args: DeployArgs, context: &Context) -> Result<Deployment, ScriptError> {
    // Make sure the artifact exists before starting anything
    let registry = ArtifactRegistry::new(&args.artifacts);
    registry.artifact_path(&args.contract)?;

    let connection = connect(&context.network_name, context.network()?).await?;
    info!("Deploying from {} on chain {}", connection.deployer, connection.chain_id);

    let factory = RpcFactory::new(&connection);
    deploy_with(&factory, &registry, &args.contract, &context.network_name, &args.output).await
}

/// Create `contract` through `factory` and record where it landed
pub async fn deploy_with<F: ContractFactory>(
    factory: &F,
    registry: &ArtifactRegistry,
    contract: &str,
    network: &str,
    output: &Path,
) -> Result<Deployment, ScriptError> {
    let artifact = registry.artifact(contract)?;
    // The record must be writable before anything lands on chain
    ensure_output_file(output)?;

    let deployment = factory.deploy(&artifact).await?;
    info!(
        "{} address is -> {}",
        deployment.contract_name.to_lowercase(),
        deployment.address
    );

    write_output_file(
        output,
        OutputKeys::Address { network, contract },
        deployment.address,
    )?;
    write_output_file(
        output,
        OutputKeys::DeployTx { network, contract },
        deployment.tx_hash,
    )?;

    Ok(deployment)
}

/// Compile every source with the configured compiler
pub fn compile_contracts(args: CompileArgs, context: &Context) -> Result<(), ScriptError> {
    let compiler = context.config.compiler()?;
    let registry = ArtifactRegistry::new(&args.artifacts);

    let builder = match &args.solc {
        Some(solc) => SolcBuilder::with_binary(compiler, solc),
        None => SolcBuilder::new(compiler),
    };
    builder.build(&args.sources, &registry)?;
    info!("Built with success");

    Ok(())
}

/// Print the accounts of the selected network
pub fn list_accounts(context: &Context) -> Result<(), ScriptError> {
    let network = context.network()?;
    for (index, address) in addresses(&network.accounts)?.iter().enumerate() {
        info!("Account #{index}: {address}");
    }

    Ok(())
}

/// Verify a deployed contract on the configured explorer
pub async fn verify_contract(args: VerifyArgs, context: &Context) -> Result<(), ScriptError> {
    let explorer = ExplorerClient::new(&context.config.etherscan)?;

    let address = match &args.address {
        Some(address) => address.clone(),
        None => read_output_file(
            &args.output,
            OutputKeys::Address {
                network: &context.network_name,
                contract: &args.contract,
            },
        )?,
    };
    let address = address
        .parse::<Address>()
        .map_err(|e| ScriptError::Verification(format!("invalid address {address}: {e}")))?;

    let artifact = ArtifactRegistry::new(&args.artifacts).artifact(&args.contract)?;
    let build = BuildInfo::read(&args.artifacts)?;
    let sources = read_sources(&build, &artifact.source_name)?;

    explorer
        .verify(&VerificationRequest {
            address,
            contract_name: artifact.contract_name,
            source_name: artifact.source_name,
            sources,
            build,
        })
        .await
}

/// Content of every source of a build, or only of `source_name` when the build did not list them
fn read_sources(build: &BuildInfo, source_name: &str) -> Result<BTreeMap<String, String>, ScriptError> {
    let names = match build.sources.is_empty() {
        true => vec![source_name.to_string()],
        false => build.sources.clone(),
    };

    names
        .into_iter()
        .map(|name| {
            fs::read_to_string(&name)
                .map(|content| (name.clone(), content))
                .map_err(|e| ScriptError::Verification(format!("{name}: {e}")))
        })
        .collect()
}

/// Print the resolved configuration
pub fn show_config(context: &Context) -> Result<(), ScriptError> {
    println!("{}", context.config.redacted().to_toml()?);
    Ok(())
}

/// Log the outcome of a command and map it to the process exit code
pub fn report(result: &Result<(), ScriptError>) -> u8 {
    match result {
        Ok(()) => {
            info!("Success!");
            0
        }
        Err(err) => {
            error!("err is -> {err}");
            1
        }
    }
}
