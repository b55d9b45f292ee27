//! Stored document and similarity search models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Largest `limit` accepted by `/documents/search`.
pub const MAX_SEARCH_LIMIT: u32 = 20;

fn default_search_limit() -> u32 {
    5
}

/// A chunk of text with its embedding, ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInsert {
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: Map<String, Value>,
}

impl DocumentInsert {
    /// Grouping key used by delete-by-file and search filters.
    pub fn file_id(&self) -> Option<&str> {
        self.metadata.get("file_id").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDocumentInsert {
    pub documents: Vec<DocumentInsert>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteByFileRequest {
    pub file_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query_embedding: Vec<f32>,
    #[serde(default = "default_search_limit")]
    pub limit: u32,
    #[serde(default)]
    pub file_id: Option<String>,
}

impl SearchRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.limit > MAX_SEARCH_LIMIT {
            return Err(format!(
                "limit must be at most {}, got {}",
                MAX_SEARCH_LIMIT, self.limit
            ));
        }
        if self.query_embedding.is_empty() {
            return Err("query_embedding must not be empty".to_string());
        }
        Ok(())
    }
}

/// A single similarity search hit, ranked by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: i64,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub similarity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertResponse {
    pub status: String,
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInsertResponse {
    pub status: String,
    pub inserted_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub status: String,
    pub deleted_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConnectionResponse {
    pub status: String,
    pub url: String,
}
