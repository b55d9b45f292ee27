//! Document store abstraction layer.
//!
//! This module provides a trait-based abstraction over the backends that hold
//! embedded document chunks (Supabase via PostgREST, PostgreSQL/pgvector directly),
//! selected by configuration. Similarity ranking always happens server-side.

mod pgvector;
mod supabase;

pub use pgvector::PgVectorBackend;
pub use supabase::SupabaseBackend;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::{DocumentInsert, SearchResult, StorageConfig, StorageDriver};
use crate::utils::{RetryPolicy, with_retry};

/// Abstract trait for document store operations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Check that the store is reachable and the documents table is readable.
    async fn health_check(&self) -> Result<(), StorageError>;

    /// Insert one document, returning its id.
    async fn insert(&self, document: DocumentInsert) -> Result<i64, StorageError>;

    /// Insert several documents, returning how many rows the backend reports.
    async fn insert_batch(&self, documents: Vec<DocumentInsert>) -> Result<usize, StorageError>;

    /// Delete every document whose `metadata.file_id` equals `file_id`.
    async fn delete_by_file(&self, file_id: &str) -> Result<usize, StorageError>;

    /// Nearest-neighbour search through the backend's match function.
    async fn search(
        &self,
        query_embedding: Vec<f32>,
        limit: u32,
        file_id: Option<&str>,
    ) -> Result<Vec<SearchResult>, StorageError>;

    /// Display location of the backend, without credentials.
    fn location(&self) -> String;
}

/// Create a document store backend based on configuration.
///
/// Connection setup is retried with exponential backoff.
pub async fn create_backend(
    config: &StorageConfig,
) -> Result<Box<dyn DocumentStore>, StorageError> {
    match config.driver {
        StorageDriver::Supabase => {
            let backend = SupabaseBackend::new(config)?;
            Ok(Box::new(backend))
        }
        StorageDriver::Postgres => {
            let backend = with_retry(&RetryPolicy::default(), "postgres_connect", || {
                PgVectorBackend::new(config)
            })
            .await
            .into_result()?;
            Ok(Box::new(backend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_supabase_backend_without_network() {
        let config = StorageConfig {
            url: Some("https://project.supabase.co/".to_string()),
            api_key: Some("service-key".to_string()),
            ..Default::default()
        };
        let store = create_backend(&config).await.unwrap();
        assert_eq!(store.location(), "https://project.supabase.co");
    }

    #[tokio::test(start_paused = true)]
    async fn test_postgres_misconfiguration_fails_without_backoff() {
        let missing_url = StorageConfig {
            driver: StorageDriver::Postgres,
            ..Default::default()
        };
        let bad_table = StorageConfig {
            driver: StorageDriver::Postgres,
            database_url: Some("postgres://rag@localhost/rag".to_string()),
            table: "documents; DROP TABLE x".to_string(),
            ..Default::default()
        };

        for config in [missing_url, bad_table] {
            let start = tokio::time::Instant::now();
            let result = create_backend(&config).await;
            assert!(matches!(result, Err(StorageError::Config(_))));
            assert_eq!(start.elapsed(), std::time::Duration::ZERO);
        }
    }
}
