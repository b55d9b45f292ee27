//! JSON error responses shared by every service.

use axum::Json;
use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::{ParserError, StorageError};
use crate::services::EmbedFailure;
use crate::utils::Retryable;

/// Machine-readable failure category carried in every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    UpstreamError,
    RetriesExhausted,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::InvalidRequest => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::UpstreamError | ErrorKind::RetriesExhausted | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
    kind: ErrorKind,
}

/// Error returned from handlers; rendered as `{"detail", "kind"}`.
#[derive(Debug)]
pub struct ApiError {
    kind: ErrorKind,
    detail: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, detail)
    }

    pub fn upstream(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamError, detail)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: &self.detail,
            kind: self.kind,
        };
        (self.kind.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl From<EmbedFailure> for ApiError {
    fn from(failure: EmbedFailure) -> Self {
        // A transient error at the end of the loop means the retry budget ran out.
        let kind = if failure.error.is_retryable() {
            ErrorKind::RetriesExhausted
        } else {
            ErrorKind::UpstreamError
        };
        Self::new(kind, failure.to_string())
    }
}

impl From<ParserError> for ApiError {
    fn from(error: ParserError) -> Self {
        Self::upstream(error.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        Self::upstream(error.to_string())
    }
}

/// `Json` extractor whose rejections use the service error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::invalid_request("limit must be at most 20").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["detail"], "limit must be at most 20");
        assert_eq!(body["kind"], "invalid_request");
    }

    #[test]
    fn test_embed_failure_kind() {
        let exhausted = ApiError::from(EmbedFailure {
            error: EmbeddingError::Timeout,
            attempts: 4,
        });
        assert_eq!(exhausted.kind(), ErrorKind::RetriesExhausted);
        assert!(exhausted.detail().contains("after 4 attempts"));

        let terminal = ApiError::from(EmbedFailure {
            error: EmbeddingError::ServerError {
                status: 401,
                body: "unauthorized".to_string(),
            },
            attempts: 1,
        });
        assert_eq!(terminal.kind(), ErrorKind::UpstreamError);
    }

    #[test]
    fn test_storage_error_is_upstream() {
        let error = ApiError::from(StorageError::ConnectionError("refused".to_string()));
        assert_eq!(error.kind(), ErrorKind::UpstreamError);
        assert_eq!(error.kind().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
