use async_trait::async_trait;
use pgvector::Vector;
use serde_json::{Map, Value};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use std::time::Duration;

use super::DocumentStore;
use crate::error::StorageError;
use crate::models::{DocumentInsert, SearchResult, StorageConfig};

/// Direct PostgreSQL + pgvector connection to the same schema Supabase exposes:
/// a `documents(id, content, embedding, metadata)` table and a
/// `match_documents(query_embedding, match_count)` function.
pub struct PgVectorBackend {
    pool: PgPool,
    table_name: String,
    match_function: String,
    location: String,
}

impl PgVectorBackend {
    pub async fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| StorageError::Config("DATABASE_URL is not set".to_string()))?;

        validate_identifier(&config.table)?;
        validate_identifier(&config.match_function)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_max)
            .acquire_timeout(Duration::from_secs(config.timeout_secs))
            .connect(url)
            .await
            .map_err(connect_error)?;

        let backend = Self {
            pool,
            table_name: config.table.clone(),
            match_function: config.match_function.clone(),
            location: redact_credentials(url),
        };

        backend.check_pgvector_extension().await?;

        Ok(backend)
    }

    async fn check_pgvector_extension(&self) -> Result<(), StorageError> {
        let result: Option<(String,)> =
            sqlx::query_as("SELECT extname::text FROM pg_extension WHERE extname = 'vector'")
                .fetch_optional(&self.pool)
                .await?;

        if result.is_none() {
            return Err(StorageError::Config(
                "pgvector extension is not installed. Run: CREATE EXTENSION vector;".to_string(),
            ));
        }

        Ok(())
    }

    fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (content, embedding, metadata) VALUES ($1, $2, $3) RETURNING id",
            self.table_name
        )
    }
}

/// Table and function names are interpolated into SQL, so only plain identifiers
/// (optionally schema-qualified) are accepted.
fn validate_identifier(name: &str) -> Result<(), StorageError> {
    let valid = !name.is_empty()
        && name.split('.').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !part.starts_with(|c: char| c.is_ascii_digit())
        });

    if valid {
        Ok(())
    } else {
        Err(StorageError::Config(format!(
            "invalid SQL identifier: {name}"
        )))
    }
}

/// Only unreachable servers are worth another connection attempt.
fn connect_error(error: sqlx::Error) -> StorageError {
    match error {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => {
            StorageError::ConnectionError(error.to_string())
        }
        other => StorageError::PostgresError(other),
    }
}

fn redact_credentials(url: &str) -> String {
    match (url.split_once("://"), url.rsplit_once('@')) {
        (Some((scheme, _)), Some((_, host))) => format!("{scheme}://{host}"),
        _ => url.to_string(),
    }
}

fn search_sql(match_function: &str, filtered: bool) -> String {
    let filter = if filtered {
        " WHERE metadata->>'file_id' = $3"
    } else {
        ""
    };
    format!(
        "SELECT id, content, metadata, similarity FROM {}($1, $2){}",
        match_function, filter
    )
}

#[async_trait]
impl DocumentStore for PgVectorBackend {
    async fn health_check(&self) -> Result<(), StorageError> {
        let query = format!("SELECT id FROM {} LIMIT 1", self.table_name);
        sqlx::query(&query)
            .fetch_optional(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| StorageError::ConnectionError(e.to_string()))
    }

    async fn insert(&self, document: DocumentInsert) -> Result<i64, StorageError> {
        let row: (i64,) = sqlx::query_as(&self.insert_sql())
            .bind(&document.content)
            .bind(Vector::from(document.embedding))
            .bind(Json(&document.metadata))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn insert_batch(&self, documents: Vec<DocumentInsert>) -> Result<usize, StorageError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let query = self.insert_sql();
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for document in documents {
            sqlx::query(&query)
                .bind(&document.content)
                .bind(Vector::from(document.embedding))
                .bind(Json(&document.metadata))
                .execute(&mut *tx)
                .await?;
            inserted += 1;
        }

        tx.commit().await?;

        Ok(inserted)
    }

    async fn delete_by_file(&self, file_id: &str) -> Result<usize, StorageError> {
        let query = format!(
            "DELETE FROM {} WHERE metadata->>'file_id' = $1",
            self.table_name
        );

        let result = sqlx::query(&query)
            .bind(file_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() as usize)
    }

    async fn search(
        &self,
        query_embedding: Vec<f32>,
        limit: u32,
        file_id: Option<&str>,
    ) -> Result<Vec<SearchResult>, StorageError> {
        let query = search_sql(&self.match_function, file_id.is_some());
        let mut query_builder = sqlx::query(&query)
            .bind(Vector::from(query_embedding))
            .bind(limit as i32);

        if let Some(file_id) = file_id {
            query_builder = query_builder.bind(file_id);
        }

        let rows = query_builder.fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|row: PgRow| -> Result<SearchResult, StorageError> {
                let metadata: Json<Map<String, Value>> = row.try_get("metadata")?;
                Ok(SearchResult {
                    id: row.try_get("id")?,
                    content: row.try_get("content")?,
                    metadata: metadata.0,
                    similarity: row.try_get("similarity")?,
                })
            })
            .collect()
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}
