use anyhow::Result;

use crate::cli::output::{StatusInfo, UpstreamStatus, get_formatter};
use crate::models::{Config, OutputFormat, StorageDriver};
use crate::services::{EmbedderService, create_backend};

pub async fn handle_status(config: &Config, format: OutputFormat, verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    let status = StatusInfo {
        upstreams: vec![
            check_embedder(config).await,
            check_parser(config),
            check_storage(config).await,
        ],
    };

    print!("{}", formatter.format_status(&status));

    if !status.all_healthy() {
        eprintln!();
        eprintln!("Hint: credentials are read from the environment or a .env file.");
        if verbose {
            eprintln!("      Run `rag-ingest config show` to see the resolved configuration.");
        }
    }

    Ok(())
}

async fn check_embedder(config: &Config) -> UpstreamStatus {
    let mut status = UpstreamStatus {
        name: "embedder",
        target: config.embedder.url.clone(),
        configured: config.require_embedder().is_ok(),
        connected: None,
        detail: None,
    };
    if !status.configured {
        return status;
    }

    let result = match EmbedderService::from_config(&config.embedder) {
        Ok(service) => service
            .test_connection()
            .await
            .map(|len| format!("{}, embedding length {}", service.model(), len))
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    apply(&mut status, result);
    status
}

/// Parser jobs are billed, so the parser is only checked for credentials.
fn check_parser(config: &Config) -> UpstreamStatus {
    UpstreamStatus {
        name: "parser",
        target: config.parser.base_url.clone(),
        configured: config.require_parser().is_ok(),
        connected: None,
        detail: None,
    }
}

async fn check_storage(config: &Config) -> UpstreamStatus {
    let masked = config.masked();
    let target = match config.storage.driver {
        StorageDriver::Supabase => masked.storage.url.unwrap_or_default(),
        StorageDriver::Postgres => masked.storage.database_url.unwrap_or_default(),
    };
    let mut status = UpstreamStatus {
        name: "storage",
        target,
        configured: config.require_storage().is_ok(),
        connected: None,
        detail: None,
    };
    if !status.configured {
        return status;
    }

    let result = match create_backend(&config.storage).await {
        Ok(store) => store
            .health_check()
            .await
            .map(|_| format!("{} driver", config.storage.driver))
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    apply(&mut status, result);
    status
}

fn apply(status: &mut UpstreamStatus, result: Result<String, String>) {
    match result {
        Ok(detail) => {
            status.connected = Some(true);
            status.detail = Some(detail);
        }
        Err(error) => {
            status.connected = Some(false);
            status.detail = Some(error);
        }
    }
}
