//! Error types for the ingestion services.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// HTTP statuses worth retrying: request timeout, rate limiting and server-side failures.
fn is_transient_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..=599).contains(&status)
}

fn is_transient_transport(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding provider: {0}")]
    ConnectionError(String),

    #[error("embedding provider returned status {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            EmbeddingError::ServerError { status, .. } => is_transient_status(*status),
            EmbeddingError::RequestError(e) => is_transient_transport(e),
            EmbeddingError::InvalidResponse(_) => false,
        }
    }
}

/// Errors related to document parsing operations.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("failed to download file: {0}")]
    DownloadError(String),

    #[error("file download returned status {status}")]
    DownloadStatus { status: u16 },

    #[error("parsing provider returned status {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("parsing request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid parsing response: {0}")]
    InvalidResponse(String),

    #[error("parse job {job_id} is still {status}")]
    JobPending { job_id: String, status: String },
}

impl Retryable for ParserError {
    fn is_retryable(&self) -> bool {
        match self {
            ParserError::JobPending { .. } => true,
            ParserError::DownloadStatus { status } | ParserError::ServerError { status, .. } => {
                is_transient_status(*status)
            }
            ParserError::RequestError(e) => is_transient_transport(e),
            ParserError::DownloadError(_) | ParserError::InvalidResponse(_) => false,
        }
    }
}

/// Errors related to document store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to document store: {0}")]
    ConnectionError(String),

    #[error("document store returned status {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("document store request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("PostgreSQL error: {0}")]
    PostgresError(#[from] sqlx::Error),

    #[error("invalid document store response: {0}")]
    InvalidResponse(String),

    #[error("document store misconfigured: {0}")]
    Config(String),
}

impl Retryable for StorageError {
    fn is_retryable(&self) -> bool {
        match self {
            StorageError::ConnectionError(_) => true,
            StorageError::ServerError { status, .. } => is_transient_status(*status),
            StorageError::RequestError(e) => is_transient_transport(e),
            StorageError::PostgresError(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            StorageError::InvalidResponse(_) | StorageError::Config(_) => false,
        }
    }
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("invalid value for {key}: {message}")]
    InvalidEnv { key: String, message: String },

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors raised while binding or running an HTTP service.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid listen address `{address}`: {source}")]
    InvalidListenAddr {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("server error: {0}")]
    Server(#[from] ServerError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("parser error: {0}")]
    Parser(#[from] ParserError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_error_classification() {
        let transient = EmbeddingError::ServerError {
            status: 503,
            body: "unavailable".to_string(),
        };
        let rate_limited = EmbeddingError::ServerError {
            status: 429,
            body: String::new(),
        };
        let terminal = EmbeddingError::ServerError {
            status: 400,
            body: "bad request".to_string(),
        };
        assert!(transient.is_retryable());
        assert!(rate_limited.is_retryable());
        assert!(!terminal.is_retryable());
        assert!(EmbeddingError::Timeout.is_retryable());
        assert!(!EmbeddingError::InvalidResponse("missing field".to_string()).is_retryable());
    }

    #[test]
    fn test_parser_error_classification() {
        let pending = ParserError::JobPending {
            job_id: "job-1".to_string(),
            status: "PENDING".to_string(),
        };
        assert!(pending.is_retryable());
        assert!(!ParserError::DownloadStatus { status: 404 }.is_retryable());
        assert!(ParserError::DownloadStatus { status: 502 }.is_retryable());
    }

    #[test]
    fn test_storage_error_classification() {
        assert!(StorageError::ConnectionError("refused".to_string()).is_retryable());
        assert!(!StorageError::Config("DATABASE_URL is not set".to_string()).is_retryable());
        assert!(
            !StorageError::PostgresError(sqlx::Error::Configuration("bad url".into()))
                .is_retryable()
        );
        assert!(
            !StorageError::ServerError {
                status: 409,
                body: "conflict".to_string()
            }
            .is_retryable()
        );
    }
}
