use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Show the resolved configuration with secrets masked")]
    Show,
    #[command(about = "Show the default configuration file path")]
    Path,
}

pub fn handle_config(
    cmd: ConfigCommand,
    config: &Config,
    explicit_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    match cmd {
        ConfigCommand::Show => handle_show(config, format),
        ConfigCommand::Path => handle_path(explicit_path, format),
    }
}

fn handle_show(config: &Config, format: OutputFormat) -> Result<()> {
    let masked = config.masked();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&masked)?);
    } else {
        print!(
            "{}",
            toml::to_string_pretty(&masked).context("failed to render configuration")?
        );
    }

    Ok(())
}

fn handle_path(explicit_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let default_path =
        Config::config_path().ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    if let Some(path) = explicit_path {
        println!(
            "{}",
            formatter.format_message(&format!("Config (from --config): {}", path.display()))
                .trim_end()
        );
    }

    let state = if default_path.exists() { "active" } else { "would be" };
    println!(
        "{}",
        formatter
            .format_message(&format!("Config ({state}): {}", default_path.display()))
            .trim_end()
    );

    if let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        let state = if env_path.exists() { "active" } else { "would be" };
        println!(
            "{}",
            formatter
                .format_message(&format!(".env file ({state}): {}", env_path.display()))
                .trim_end()
        );
    }

    Ok(())
}
