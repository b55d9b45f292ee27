//! Embedding provider client and the retrying embedder service built on it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;
use crate::models::{BatchFailure, EmbedderConfig, MAX_EMBED_TEXT_CHARS};
use crate::utils::{RetryOutcome, RetryPolicy, truncate_chars, with_retry};

/// Text sent by the connection smoke test.
pub const CONNECTION_TEST_TEXT: &str = "Hello, world!";

/// A remote service turning one text into one embedding vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Perform a single embedding call; no retry.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Identifier of the model reported back to callers.
    fn model(&self) -> &str;
}

/// Request body for the text embedding endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextEmbeddingRequest<'a> {
    model_uri: &'a str,
    text: &'a str,
}

/// Response from the text embedding endpoint.
#[derive(Debug, Deserialize)]
struct TextEmbeddingResponse {
    embedding: Vec<f32>,
}

/// Client for the Yandex Foundation Models text embedding API.
#[derive(Debug, Clone)]
pub struct YandexEmbeddingClient {
    client: Client,
    url: String,
    model_uri: String,
}

impl YandexEmbeddingClient {
    /// Create a new embedding client with the given configuration.
    pub fn new(config: &EmbedderConfig) -> Result<Self, EmbeddingError> {
        let api_key = config.api_key.as_deref().unwrap_or_default();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Api-Key {}", api_key.trim()))
                .map_err(|e| EmbeddingError::ConnectionError(format!("invalid API key: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            model_uri: config.model_uri(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for YandexEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = TextEmbeddingRequest {
            model_uri: &self.model_uri,
            text,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else if e.is_connect() {
                    EmbeddingError::ConnectionError(e.to_string())
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TextEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if parsed.embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse(
                "empty embedding vector".to_string(),
            ));
        }

        Ok(parsed.embedding)
    }

    fn model(&self) -> &str {
        &self.model_uri
    }
}

/// Final error of a single embed after the retry loop gave up.
#[derive(Debug)]
pub struct EmbedFailure {
    pub error: EmbeddingError,
    pub attempts: u32,
}

impl std::fmt::Display for EmbedFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (after {} attempts)", self.error, self.attempts)
    }
}

/// Outcome of a batch: successes in request order plus the indices that failed.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub embeddings: Vec<Vec<f32>>,
    pub failures: Vec<BatchFailure>,
}

/// Embeds texts through a provider, truncating input and retrying transient failures.
#[derive(Clone)]
pub struct EmbedderService {
    provider: Arc<dyn EmbeddingProvider>,
    policy: RetryPolicy,
}

impl EmbedderService {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn from_config(config: &EmbedderConfig) -> Result<Self, EmbeddingError> {
        let client = YandexEmbeddingClient::new(config)?;
        Ok(Self::new(Arc::new(client), config.retry_policy()))
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Embed one text. Input beyond the provider limit is cut off before sending.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedFailure> {
        let text = truncate_chars(text, MAX_EMBED_TEXT_CHARS);
        let outcome = with_retry(&self.policy, "embed", || self.provider.embed(text)).await;

        match outcome {
            RetryOutcome::Success { value, .. } => Ok(value),
            RetryOutcome::Failed {
                last_error,
                attempts,
            } => Err(EmbedFailure {
                error: last_error,
                attempts,
            }),
        }
    }

    /// Embed all texts concurrently; one failure does not affect the others.
    pub async fn embed_batch(&self, texts: &[String]) -> BatchOutcome {
        let results = join_all(texts.iter().map(|text| self.embed(text))).await;

        let mut outcome = BatchOutcome::default();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(embedding) => outcome.embeddings.push(embedding),
                Err(failure) => outcome.failures.push(BatchFailure {
                    index,
                    error: failure.to_string(),
                }),
            }
        }

        if !outcome.failures.is_empty() {
            tracing::warn!(
                succeeded = outcome.embeddings.len(),
                total = texts.len(),
                "some embeddings failed"
            );
        }

        outcome
    }

    /// Smoke test against the provider; returns the embedding length.
    pub async fn test_connection(&self) -> Result<usize, EmbedFailure> {
        self.embed(CONNECTION_TEST_TEXT).await.map(|e| e.len())
    }
}
