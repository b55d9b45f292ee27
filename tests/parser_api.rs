mod common;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::http::StatusCode;
use serde_json::json;

use common::{assert_error, get, post_json};
use rag_ingest::error::ParserError;
use rag_ingest::models::JobStatus;
use rag_ingest::server::{ServiceKind, instrument, parser};
use rag_ingest::services::{ParserService, ParsingProvider, ProviderPage};
use rag_ingest::utils::RetryPolicy;

/// Scripted provider: status answers are consumed in order, the last one repeats.
#[derive(Default)]
struct FakeProvider {
    uploads: Mutex<Vec<(String, usize)>>,
    statuses: Mutex<VecDeque<&'static str>>,
    status_calls: Mutex<u32>,
    pages: Vec<Option<&'static str>>,
    broken_downloads: bool,
}

#[async_trait]
impl ParsingProvider for FakeProvider {
    async fn download(&self, url: &str) -> Result<Vec<u8>, ParserError> {
        if self.broken_downloads {
            return Err(ParserError::DownloadStatus { status: 403 });
        }
        Ok(url.as_bytes().to_vec())
    }

    async fn upload(&self, file_name: &str, content: Vec<u8>) -> Result<String, ParserError> {
        self.uploads
            .lock()
            .unwrap()
            .push((file_name.to_string(), content.len()));
        Ok("job-42".to_string())
    }

    async fn job_status(&self, _job_id: &str) -> Result<JobStatus, ParserError> {
        *self.status_calls.lock().unwrap() += 1;
        let mut statuses = self.statuses.lock().unwrap();
        let status = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().copied()
        };
        match status {
            Some(status) => Ok(JobStatus {
                status: status.to_string(),
                error: None,
            }),
            None => Err(ParserError::ServerError {
                status: 404,
                body: "unknown job".to_string(),
            }),
        }
    }

    async fn job_result(&self, job_id: &str) -> Result<Vec<ProviderPage>, ParserError> {
        if self.pages.is_empty() {
            return Err(ParserError::ServerError {
                status: 404,
                body: format!("no result for {job_id}"),
            });
        }
        Ok(self
            .pages
            .iter()
            .map(|text| ProviderPage {
                text: text.map(str::to_string),
            })
            .collect())
    }
}

fn app(provider: FakeProvider) -> (Router, Arc<FakeProvider>) {
    let provider = Arc::new(provider);
    let service = ParserService::new(provider.clone(), RetryPolicy::fixed(20, Duration::ZERO));
    (
        instrument(parser::router(service), ServiceKind::Parser),
        provider,
    )
}

fn with_statuses(statuses: &[&'static str]) -> FakeProvider {
    FakeProvider {
        statuses: Mutex::new(statuses.iter().copied().collect()),
        ..Default::default()
    }
}

#[tokio::test]
async fn upload_returns_job_id() {
    let (router, provider) = app(FakeProvider::default());
    let (status, body) = post_json(
        &router,
        "/parse/upload",
        json!({
            "file_id": "drive-1",
            "file_url": "https://files.example/signed",
            "file_name": "report.pdf"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PROCESSING");
    assert_eq!(body["file_id"], "drive-1");
    assert_eq!(body["job_id"], "job-42");
    assert_eq!(
        provider.uploads.lock().unwrap()[0],
        ("report.pdf".to_string(), "https://files.example/signed".len())
    );
}

#[tokio::test]
async fn upload_failure_is_reported_in_body() {
    let (router, provider) = app(FakeProvider {
        broken_downloads: true,
        ..Default::default()
    });
    let (status, body) = post_json(
        &router,
        "/parse/upload",
        json!({ "file_id": "drive-2", "file_url": "https://x", "file_name": "a.pdf" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ERROR");
    assert!(body["job_id"].is_null());
    assert!(body["error_message"].as_str().unwrap().contains("403"));
    assert!(provider.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn status_checks_once_by_default() {
    let (router, provider) = app(with_statuses(&["PENDING", "SUCCESS"]));
    let (status, body) = post_json(&router, "/parse/status", json!({ "job_id": "job-42" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["retry_count"], 0);
    assert_eq!(*provider.status_calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn status_wait_polls_until_done() {
    let (router, provider) = app(with_statuses(&["PENDING", "PENDING", "SUCCESS"]));
    let (status, body) = post_json(
        &router,
        "/parse/status",
        json!({ "job_id": "job-42", "wait": true }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "SUCCESS");
    assert_eq!(body["retry_count"], 2);
    assert_eq!(*provider.status_calls.lock().unwrap(), 3);
}

#[tokio::test]
async fn status_wait_stops_at_poll_budget() {
    let (router, provider) = app(with_statuses(&["PENDING"]));
    let (_, body) = post_json(
        &router,
        "/parse/status",
        json!({ "job_id": "job-42", "wait": true }),
    )
    .await;

    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["retry_count"], 20);
    assert_eq!(*provider.status_calls.lock().unwrap(), 21);
}

#[tokio::test]
async fn status_failure_is_reported_in_body() {
    let (router, _) = app(FakeProvider::default());
    let (status, body) = post_json(&router, "/parse/status", json!({ "job_id": "missing" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ERROR");
    assert!(body["error_message"].as_str().unwrap().contains("unknown job"));
}

#[tokio::test]
async fn result_renumbers_pages() {
    let (router, _) = app(FakeProvider {
        pages: vec![Some("intro"), None, Some("summary")],
        ..Default::default()
    });
    let (status, body) = post_json(&router, "/parse/result", json!({ "job_id": "job-42" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "SUCCESS");
    assert_eq!(body["total_pages"], 3);
    assert_eq!(
        body["pages"],
        json!([
            { "page_number": 1, "text": "intro" },
            { "page_number": 2, "text": "" },
            { "page_number": 3, "text": "summary" }
        ])
    );
}

#[tokio::test]
async fn result_failure_is_an_error_response() {
    let (router, _) = app(FakeProvider::default());
    let (status, body) = post_json(&router, "/parse/result", json!({ "job_id": "job-9" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(assert_error(&body, "upstream_error").contains("no result for job-9"));
}

#[tokio::test]
async fn health_names_service() {
    let (router, _) = app(FakeProvider::default());
    let (_, body) = get(&router, "/health").await;
    assert_eq!(body["service"], "parser-service");
}
