use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rag_ingest::cli::commands::{handle_config, handle_serve, handle_status};
use rag_ingest::cli::{Cli, Commands};
use rag_ingest::models::Config;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    let format = cli.format.unwrap_or_default();

    match cli.command {
        Commands::Serve(args) => handle_serve(args, &config).await?,
        Commands::Status => handle_status(&config, format, cli.verbose).await?,
        Commands::Config(cmd) => handle_config(cmd, &config, cli.config.as_deref(), format)?,
    }

    Ok(())
}
