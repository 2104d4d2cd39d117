//! userhub Server Entry Point

use clap::Parser;
use userhub::cli::{Cli, Commands};
use userhub::config::AppConfig;
use userhub::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init()?;
    let config = AppConfig::from_env();

    match cli.command {
        Some(Commands::Migrate(args)) => userhub::cli::migrate::execute(&args, &config).await,
        Some(Commands::Serve(args)) => userhub::cli::serve::execute(&args, config).await,
        // No subcommand - default to serve
        None => userhub::cli::serve::execute(&Default::default(), config).await,
    }
}
