#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");

    let status = response.status();
    let body_bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body must be readable")
        .to_bytes();
    let body_text = std::str::from_utf8(body_bytes.as_ref()).unwrap_or("<non-utf8>");
    let value: Value = serde_json::from_slice(body_bytes.as_ref())
        .unwrap_or_else(|err| panic!("invalid json: {err}; body={body_text}"));
    (status, value)
}

pub async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(router, uri, body.to_string()).await
}

pub async fn post_raw(router: &Router, uri: &str, body: impl Into<String>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .expect("request builder must not fail");
    send(router, request).await
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request builder must not fail");
    send(router, request).await
}

/// Assert the shared error body shape and return its detail.
pub fn assert_error(body: &Value, kind: &str) -> String {
    assert_eq!(body["kind"], kind, "unexpected error body: {body}");
    body["detail"]
        .as_str()
        .unwrap_or_else(|| panic!("detail must be a string: {body}"))
        .to_string()
}
