#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use bookshelf_api::{app, AppState, MemoryStore};
use serde_json::Value;
use tower::ServiceExt;

pub fn test_app() -> Router {
    app(AppState::new(MemoryStore::new()), 64 * 1024)
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    match body {
        Some(json) => send_raw(app, method, uri, Some("application/json"), &json.to_string()).await,
        None => send_raw(app, method, uri, None, "").await,
    }
}

/// Sends `body` verbatim; the response must still be JSON (or empty).
pub async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    let request = builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request");

    let resp = app.clone().oneshot(request).await.expect("request failed");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body was not JSON")
    };
    (status, json)
}

pub async fn create_author(app: &Router, name: &str, email: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/authors",
        Some(serde_json::json!({ "name": name, "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

pub async fn create_book(app: &Router, title: &str, isbn: &str, author_id: i64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/books",
        Some(serde_json::json!({
            "title": title,
            "isbn": isbn,
            "published_date": "1965-08-01",
            "author_id": author_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

/// Field-keyed messages from a 422 body.
pub fn field_errors<'a>(body: &'a Value, field: &str) -> &'a Vec<Value> {
    body["error"]["details"][field]
        .as_array()
        .unwrap_or_else(|| panic!("no errors for {field} in {body}"))
}
