mod common;

use axum::Router;
use axum::http::StatusCode;
use serde_json::json;

use common::{assert_error, get, post_json, post_raw};
use rag_ingest::server::{ServiceKind, instrument, validation};
use rag_ingest::services::FileValidator;

const PDF: &str = "application/pdf";

fn app() -> Router {
    instrument(validation::router(FileValidator::default()), ServiceKind::Validation)
}

#[tokio::test]
async fn valid_pdf_estimates_pages() {
    let (status, body) = post_json(
        &app(),
        "/validate",
        json!({
            "file_id": "drive-1",
            "file_name": "report.pdf",
            "file_type": PDF,
            "file_size_bytes": 102400
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "VALID");
    assert_eq!(body["file_id"], "drive-1");
    assert_eq!(body["estimated_pages"], 2);
    assert!(body["error_message"].is_null());
    assert!(chrono::DateTime::parse_from_rfc3339(body["validated_at"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn unsupported_type_is_invalid_with_200() {
    let (status, body) = post_json(
        &app(),
        "/validate",
        json!({
            "file_id": "drive-2",
            "file_name": "photo.png",
            "file_type": "image/png",
            "file_size_bytes": 1000
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "INVALID");
    assert_eq!(body["error_message"], "Unsupported file type: image/png");
    assert!(body["estimated_pages"].is_null());
}

#[tokio::test]
async fn oversized_file_reports_size() {
    let (_, body) = post_json(
        &app(),
        "/validate",
        json!({
            "file_id": "drive-3",
            "file_name": "big.pdf",
            "file_type": PDF,
            "file_size_bytes": 60u64 * 1024 * 1024
        }),
    )
    .await;

    assert_eq!(body["status"], "INVALID");
    assert_eq!(body["error_message"], "File too large: 60.00MB (max: 50MB)");
}

#[tokio::test]
async fn repeated_validation_is_stable() {
    let router = app();
    let request = json!({
        "file_id": "drive-4",
        "file_name": "sheet.xlsx",
        "file_type": "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "file_size_bytes": 512000
    });

    let (_, first) = post_json(&router, "/validate", request.clone()).await;
    let (_, second) = post_json(&router, "/validate", request).await;

    assert_eq!(first["status"], second["status"]);
    assert_eq!(first["estimated_pages"], second["estimated_pages"]);
    assert_eq!(first["estimated_pages"], 10);
}

#[tokio::test]
async fn missing_field_is_rejected_with_error_shape() {
    let (status, body) = post_json(
        &app(),
        "/validate",
        json!({ "file_id": "drive-5", "file_name": "a.pdf", "file_type": PDF }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let detail = assert_error(&body, "invalid_request");
    assert!(detail.contains("file_size_bytes"), "detail: {detail}");
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let (status, body) = post_raw(&app(), "/validate", "{not json").await;

    assert!(status.is_client_error());
    assert_error(&body, "invalid_request");
}

#[tokio::test]
async fn health_and_metrics() {
    let router = app();

    let (status, health) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "validation-service");

    let (_, metrics) = get(&router, "/metrics").await;
    assert_eq!(metrics["service"], "validation-service");
    assert_eq!(metrics["requests_total"], 2);
}
