//! HTTP services: one axum router per pipeline stage plus shared plumbing.

pub mod embedder;
pub mod error;
pub mod parser;
pub mod storage;
pub mod validation;

pub use error::{ApiError, ApiJson, ErrorKind};

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::error::ServerError;

/// The four pipeline stages, each served as its own process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ServiceKind {
    Validation,
    Parser,
    Embedder,
    Storage,
}

impl ServiceKind {
    /// Name reported by `/health` and `/metrics`.
    pub fn name(self) -> &'static str {
        match self {
            ServiceKind::Validation => "validation-service",
            ServiceKind::Parser => "parser-service",
            ServiceKind::Embedder => "embedder-service",
            ServiceKind::Storage => "storage-service",
        }
    }

    pub fn default_bind(self) -> &'static str {
        match self {
            ServiceKind::Validation => "0.0.0.0:8001",
            ServiceKind::Parser => "0.0.0.0:8002",
            ServiceKind::Embedder => "0.0.0.0:8003",
            ServiceKind::Storage => "0.0.0.0:8004",
        }
    }
}

/// Per-process counters exposed by `/metrics`.
#[derive(Debug)]
pub struct ServiceStats {
    service: &'static str,
    started: Instant,
    requests: AtomicU64,
}

impl ServiceStats {
    pub fn new(service: &'static str) -> Self {
        Self {
            service,
            started: Instant::now(),
            requests: AtomicU64::new(0),
        }
    }

    pub fn requests_total(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct MetricsResponse {
    service: &'static str,
    uptime_seconds: u64,
    requests_total: u64,
}

/// Add `/health` and `/metrics` to a service router and count every request it serves.
pub fn instrument(router: Router, kind: ServiceKind) -> Router {
    let stats = Arc::new(ServiceStats::new(kind.name()));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(stats.clone())
        .merge(router)
        .layer(middleware::from_fn_with_state(stats, count_requests))
}

async fn count_requests(
    State(stats): State<Arc<ServiceStats>>,
    request: Request,
    next: Next,
) -> Response {
    stats.requests.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(method = %request.method(), path = %request.uri().path(), "request");
    next.run(request).await
}

async fn health(State(stats): State<Arc<ServiceStats>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: stats.service,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn metrics(State(stats): State<Arc<ServiceStats>>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        service: stats.service,
        uptime_seconds: stats.started.elapsed().as_secs(),
        requests_total: stats.requests_total(),
    })
}

/// Serve `router` on `bind` until Ctrl-C or SIGTERM, then drain in-flight requests.
pub async fn serve(router: Router, bind: &str) -> Result<(), ServerError> {
    let addr = parse_listen_addr(bind)?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            address: addr.to_string(),
            source,
        })?;

    let local_addr = listener.local_addr().map_err(ServerError::Serve)?;
    tracing::info!(%local_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .map_err(ServerError::Serve)?;

    tracing::info!("server stopped");
    Ok(())
}

fn parse_listen_addr(addr: &str) -> Result<SocketAddr, ServerError> {
    let trimmed = addr.trim();
    trimmed
        .parse()
        .map_err(|source| ServerError::InvalidListenAddr {
            address: trimmed.to_string(),
            source,
        })
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "failed to capture Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to capture SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = sigterm => tracing::info!("received SIGTERM, shutting down"),
    }
}
