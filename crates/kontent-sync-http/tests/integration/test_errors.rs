//! Integration tests for error classification of real HTTP failures

use std::sync::Arc;

use kontent_sync_core::config::RetryConfig;
use kontent_sync_core::domain::{DeltaPage, SyncErrorReason, SyncResult, GENERIC_ERROR_MESSAGE};
use kontent_sync_core::retry::RetryPolicy;
use kontent_sync_core::usecases::SyncClient;
use kontent_sync_http::ReqwestTransport;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

/// Fetches one delta page from a server that always answers `response`
async fn delta_with_response(response: ResponseTemplate) -> SyncResult<DeltaPage> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::delta_path()))
        .respond_with(response)
        .mount(&server)
        .await;

    let retry = RetryConfig {
        enabled: false,
        ..common::fast_retry()
    };
    common::client_with_retry(&server, &retry)
        .get_delta("token", &CancellationToken::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_bad_token_is_invalid_response() {
    let result = delta_with_response(
        ResponseTemplate::new(400).set_body_json(serde_json::json!({ "message": "Invalid token" })),
    )
    .await;

    assert!(!result.is_success());
    assert_eq!(result.status_code(), 400);
    let error = result.error().unwrap();
    assert_eq!(error.message, "Invalid token");
    assert_eq!(error.reason, SyncErrorReason::InvalidResponse);
    assert_eq!(error.error_code, Some(400));
}

#[tokio::test]
async fn test_error_body_keys_are_case_insensitive() {
    let result = delta_with_response(ResponseTemplate::new(403).set_body_json(serde_json::json!({
        "Message": "Forbidden for this key",
        "Request_Id": "req-1",
        "Error_Code": 7
    })))
    .await;

    let error = result.error().unwrap();
    assert_eq!(error.message, "Forbidden for this key");
    assert_eq!(error.request_id.as_deref(), Some("req-1"));
    assert_eq!(error.error_code, Some(7));
    assert_eq!(error.reason, SyncErrorReason::Unauthorized);
}

#[tokio::test]
async fn test_non_json_error_body_becomes_message() {
    let result = delta_with_response(
        ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"),
    )
    .await;

    let error = result.error().unwrap();
    assert_eq!(error.message, "<html>Bad Gateway</html>");
    assert_eq!(error.error_code, Some(502));
    assert_eq!(error.reason, SyncErrorReason::ServerError);
}

#[tokio::test]
async fn test_empty_error_body_uses_reason_phrase() {
    let result = delta_with_response(ResponseTemplate::new(404)).await;

    let error = result.error().unwrap();
    assert_eq!(error.message, "Not Found");
    assert_eq!(error.reason, SyncErrorReason::NotFound);
}

#[tokio::test]
async fn test_unknown_status_without_phrase_uses_generic_message() {
    let result = delta_with_response(ResponseTemplate::new(599)).await;

    let error = result.error().unwrap();
    assert_eq!(error.message, GENERIC_ERROR_MESSAGE);
    assert_eq!(error.reason, SyncErrorReason::ServerError);
}

#[tokio::test]
async fn test_rate_limited_after_retries_disabled() {
    let result = delta_with_response(ResponseTemplate::new(429)).await;
    assert_eq!(result.error().unwrap().reason, SyncErrorReason::RateLimited);
}

#[tokio::test]
async fn test_success_status_with_empty_body_is_failure() {
    let result = delta_with_response(
        ResponseTemplate::new(200).insert_header("X-Continuation", "B"),
    )
    .await;

    assert!(!result.is_success());
    assert!(result.sync_token().is_none());
    assert_eq!(result.error().unwrap().reason, SyncErrorReason::InvalidResponse);
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let transport = ReqwestTransport::new("http://127.0.0.1:1");
    let client = SyncClient::new(
        Arc::new(transport),
        common::ENV.parse().unwrap(),
        RetryPolicy::new(&common::fast_retry()),
    );

    let result = client
        .get_delta("A", &CancellationToken::new())
        .await
        .unwrap();

    assert!(!result.is_success());
    assert_eq!(result.status_code(), 0);
    let error = result.error().unwrap();
    assert_eq!(error.reason, SyncErrorReason::NetworkError);
    assert_eq!(error.error_code, None);
    assert!(error.cause.is_some());
    assert_eq!(
        result.request_url(),
        format!("http://127.0.0.1:1/{}/sync", common::ENV)
    );
}
