use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use super::ApiJson;
use crate::models::{FileValidationRequest, FileValidationResponse};
use crate::services::FileValidator;

pub fn router(validator: FileValidator) -> Router {
    Router::new()
        .route("/validate", post(validate))
        .with_state(Arc::new(validator))
}

/// Rejections are reported in the body with status INVALID, never as an HTTP error.
async fn validate(
    State(validator): State<Arc<FileValidator>>,
    ApiJson(request): ApiJson<FileValidationRequest>,
) -> Json<FileValidationResponse> {
    tracing::info!(file_id = %request.file_id, file_name = %request.file_name, "validating file");
    Json(validator.validate(&request, chrono::Utc::now().to_rfc3339()))
}
