use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::{ApiError, ApiJson};
use crate::models::{
    BatchDocumentInsert, BatchInsertResponse, DeleteByFileRequest, DeleteResponse,
    DocumentInsert, InsertResponse, SearchRequest, SearchResult, StoreConnectionResponse,
};
use crate::services::DocumentStore;

type Store = Arc<dyn DocumentStore>;

const SUCCESS: &str = "success";

pub fn router(store: Store) -> Router {
    Router::new()
        .route("/documents/insert", post(insert))
        .route("/documents/batch-insert", post(batch_insert))
        .route("/documents/delete-by-file", post(delete_by_file))
        .route("/documents/search", post(search))
        .route("/test-connection", get(test_connection))
        .with_state(store)
}

fn upstream(operation: &'static str) -> impl FnOnce(crate::error::StorageError) -> ApiError {
    move |e| {
        tracing::error!(operation, error = %e, "document store request failed");
        ApiError::from(e)
    }
}

async fn insert(
    State(store): State<Store>,
    ApiJson(document): ApiJson<DocumentInsert>,
) -> Result<Json<InsertResponse>, ApiError> {
    let id = store.insert(document).await.map_err(upstream("insert"))?;
    Ok(Json(InsertResponse {
        status: SUCCESS.to_string(),
        id,
    }))
}

async fn batch_insert(
    State(store): State<Store>,
    ApiJson(request): ApiJson<BatchDocumentInsert>,
) -> Result<Json<BatchInsertResponse>, ApiError> {
    let submitted = request.documents.len();
    let inserted_count = store
        .insert_batch(request.documents)
        .await
        .map_err(upstream("batch_insert"))?;
    tracing::info!(submitted, inserted_count, "documents inserted");

    Ok(Json(BatchInsertResponse {
        status: SUCCESS.to_string(),
        inserted_count,
    }))
}

async fn delete_by_file(
    State(store): State<Store>,
    ApiJson(request): ApiJson<DeleteByFileRequest>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted_count = store
        .delete_by_file(&request.file_id)
        .await
        .map_err(upstream("delete_by_file"))?;
    tracing::info!(file_id = %request.file_id, deleted_count, "documents deleted");

    Ok(Json(DeleteResponse {
        status: SUCCESS.to_string(),
        deleted_count,
    }))
}

async fn search(
    State(store): State<Store>,
    ApiJson(request): ApiJson<SearchRequest>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    request.validate().map_err(ApiError::invalid_request)?;

    let results = store
        .search(request.query_embedding, request.limit, request.file_id.as_deref())
        .await
        .map_err(upstream("search"))?;
    Ok(Json(results))
}

async fn test_connection(
    State(store): State<Store>,
) -> Result<Json<StoreConnectionResponse>, ApiError> {
    store
        .health_check()
        .await
        .map_err(upstream("test_connection"))?;
    Ok(Json(StoreConnectionResponse {
        status: "connected".to_string(),
        url: store.location(),
    }))
}
