//! Embedding request and response models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::char_len;

/// Longest text the embedding provider accepts, in characters.
pub const MAX_EMBED_TEXT_CHARS: usize = 8000;

/// Largest batch accepted by `/embed/batch`.
pub const MAX_BATCH_TEXTS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub text: String,
    #[serde(default)]
    pub chunk_id: Option<String>,
}

impl EmbedRequest {
    pub fn validate(&self) -> Result<(), String> {
        let len = char_len(&self.text);
        if len > MAX_EMBED_TEXT_CHARS {
            return Err(format!(
                "text must be at most {} characters, got {}",
                MAX_EMBED_TEXT_CHARS, len
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
    pub chunk_id: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEmbedRequest {
    pub texts: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl BatchEmbedRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.texts.len() > MAX_BATCH_TEXTS {
            return Err(format!(
                "texts must contain at most {} items, got {}",
                MAX_BATCH_TEXTS,
                self.texts.len()
            ));
        }
        Ok(())
    }
}

/// A batch item that could not be embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Position of the text in the request.
    pub index: usize,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEmbedResponse {
    /// Successful embeddings, in request order.
    pub embeddings: Vec<Vec<f32>>,
    pub count: usize,
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTestResponse {
    pub status: String,
    pub embedding_length: usize,
    pub model: String,
}
