use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use clap::Args;

use crate::error::AppError;
use crate::models::Config;
use crate::server::{self, ServiceKind};
use crate::services::{EmbedderService, FileValidator, ParserService, create_backend};

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Service to run
    #[arg(value_enum)]
    pub service: ServiceKind,

    /// Listen address, e.g. 0.0.0.0:8003
    #[arg(long, short = 'b')]
    pub bind: Option<String>,
}

pub async fn handle_serve(args: ServeArgs, config: &Config) -> Result<()> {
    let bind = args
        .bind
        .or_else(|| config.server.bind.clone())
        .unwrap_or_else(|| args.service.default_bind().to_string());

    let router = build_router(args.service, config).await?;

    tracing::info!(service = args.service.name(), %bind, "starting service");
    server::serve(router, &bind).await?;
    Ok(())
}

/// Construct the service state once and mount it on its router.
pub async fn build_router(kind: ServiceKind, config: &Config) -> Result<Router, AppError> {
    let router = match kind {
        ServiceKind::Validation => server::validation::router(FileValidator::new(&config.validation)),
        ServiceKind::Parser => {
            config.require_parser()?;
            let service = ParserService::from_config(&config.parser)?;
            server::parser::router(service)
        }
        ServiceKind::Embedder => {
            config.require_embedder()?;
            let service = EmbedderService::from_config(&config.embedder)?;
            tracing::info!(model = service.model(), "embedding model configured");
            server::embedder::router(service)
        }
        ServiceKind::Storage => {
            config.require_storage()?;
            let store = create_backend(&config.storage).await?;
            tracing::info!(driver = %config.storage.driver, location = %store.location(), "document store ready");
            server::storage::router(Arc::from(store))
        }
    };

    Ok(server::instrument(router, kind))
}
