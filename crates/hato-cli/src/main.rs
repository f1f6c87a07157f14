//! Hato CLI main entry point

use anyhow::Result;
use clap::Parser;
use hato_cli::commands::{Cli, CommandExecutor};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let executor = CommandExecutor::new(cli.client_config()?)?;
    let result = executor.execute(cli.command).await;
    executor.close();

    // Exit with appropriate code
    if result?.success {
        std::process::exit(0);
    } else {
        std::process::exit(1);
    }
}
