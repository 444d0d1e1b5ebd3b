//! Integration tests for the operational endpoints.

mod common;

use common::TestApp;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn health_check_returns_ok() {
    let (app, _provider) = TestApp::spawn_replying().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(StatusCode::OK, response.status());
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "gemini-relay");

    app.cleanup().await;
}

#[tokio::test]
async fn metrics_report_relay_requests() {
    let (app, _provider) = TestApp::spawn_replying().await;

    app.post_json("/generate-text", json!({"prompt": "count me"})).await;

    let response = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(StatusCode::OK, response.status());
    let text = response.text().await.expect("Failed to read body");
    assert!(text.contains("relay_requests_total"));
    assert!(text.contains("genai_provider_latency_seconds"));

    app.cleanup().await;
}

#[tokio::test]
async fn upload_directory_is_created_at_startup() {
    let (app, _provider) = TestApp::spawn_replying().await;

    assert!(app.upload_dir.is_dir());
    assert!(app.staged_files().is_empty());

    app.cleanup().await;
}
