use std::process::ExitCode;

use authentico_scripts::{cli::Cli, commands::report, config::EnvSecrets};
use clap::Parser;
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file
    dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let secrets = EnvSecrets::from_env();
    let result = match cli.context(&secrets) {
        Ok(context) => cli.command.run(context).await,
        Err(err) => Err(err),
    };

    ExitCode::from(report(&result))
}
