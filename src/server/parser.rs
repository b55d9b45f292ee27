use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use super::{ApiError, ApiJson};
use crate::models::{
    ParseRequest, ParseResponse, ParseResultRequest, ParseResultResponse, ParseStatusRequest,
    ParseStatusResponse,
};
use crate::services::ParserService;

pub fn router(service: ParserService) -> Router {
    Router::new()
        .route("/parse/upload", post(upload))
        .route("/parse/status", post(status))
        .route("/parse/result", post(result))
        .with_state(service)
}

async fn upload(
    State(service): State<ParserService>,
    ApiJson(request): ApiJson<ParseRequest>,
) -> Json<ParseResponse> {
    tracing::info!(file_id = %request.file_id, file_name = %request.file_name, "parse requested");
    Json(service.submit(&request).await)
}

async fn status(
    State(service): State<ParserService>,
    ApiJson(request): ApiJson<ParseStatusRequest>,
) -> Json<ParseStatusResponse> {
    let response = if request.wait {
        service.wait_for_completion(&request.job_id).await
    } else {
        service.status(&request.job_id).await
    };
    Json(response)
}

async fn result(
    State(service): State<ParserService>,
    ApiJson(request): ApiJson<ParseResultRequest>,
) -> Result<Json<ParseResultResponse>, ApiError> {
    let response = service.result(&request.job_id).await.map_err(|e| {
        tracing::error!(job_id = %request.job_id, error = %e, "failed to fetch parse result");
        ApiError::from(e)
    })?;
    Ok(Json(response))
}
