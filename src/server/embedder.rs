use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::{ApiError, ApiJson};
use crate::models::{
    BatchEmbedRequest, BatchEmbedResponse, ConnectionTestResponse, EmbedRequest, EmbedResponse,
};
use crate::services::EmbedderService;

pub fn router(service: EmbedderService) -> Router {
    Router::new()
        .route("/embed", post(embed))
        .route("/embed/batch", post(embed_batch))
        .route("/test-connection", get(test_connection))
        .with_state(service)
}

async fn embed(
    State(service): State<EmbedderService>,
    ApiJson(request): ApiJson<EmbedRequest>,
) -> Result<Json<EmbedResponse>, ApiError> {
    request.validate().map_err(ApiError::invalid_request)?;

    let embedding = service.embed(&request.text).await.map_err(|failure| {
        tracing::error!(chunk_id = ?request.chunk_id, error = %failure, "embedding failed");
        ApiError::from(failure)
    })?;

    Ok(Json(EmbedResponse {
        embedding,
        chunk_id: request.chunk_id,
        model: service.model().to_string(),
    }))
}

async fn embed_batch(
    State(service): State<EmbedderService>,
    ApiJson(request): ApiJson<BatchEmbedRequest>,
) -> Result<Json<BatchEmbedResponse>, ApiError> {
    request.validate().map_err(ApiError::invalid_request)?;
    tracing::info!(texts = request.texts.len(), "batch embedding");

    let outcome = service.embed_batch(&request.texts).await;
    if outcome.embeddings.is_empty() {
        return Err(ApiError::upstream("All embeddings failed"));
    }

    Ok(Json(BatchEmbedResponse {
        count: outcome.embeddings.len(),
        embeddings: outcome.embeddings,
        metadata: request.metadata,
        failures: outcome.failures,
    }))
}

async fn test_connection(
    State(service): State<EmbedderService>,
) -> Result<Json<ConnectionTestResponse>, ApiError> {
    let embedding_length = service.test_connection().await?;
    Ok(Json(ConnectionTestResponse {
        status: "connected".to_string(),
        embedding_length,
        model: service.model().to_string(),
    }))
}
