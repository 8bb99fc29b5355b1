//! Integration tests for sync initialization

use kontent_sync_core::config::SyncOptionsBuilder;
use kontent_sync_core::usecases::SyncInitOptions;
use kontent_sync_http::build_client;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{self, ENV};

#[tokio::test]
async fn test_init_returns_first_token_with_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::init_path()))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Continuation", "A"))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client(&server);
    let result = client
        .initialize_sync(None, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.status_code(), 200);
    assert_eq!(result.sync_token().unwrap().as_str(), "A");
    assert!(!result.has_more_changes());
    assert!(result.request_url().ends_with(&common::init_path()));
}

#[tokio::test]
async fn test_init_sends_filters_as_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::init_path()))
        .and(query_param("system.type[in]", "article,coffee"))
        .and(query_param("system.collection[in]", "default"))
        .and(query_param("system.language", "es-ES"))
        .and(query_param("language", "es-ES"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Continuation", "filtered"))
        .expect(1)
        .mount(&server)
        .await;

    let options = SyncInitOptions::new()
        .with_content_type("coffee")
        .with_content_type("article")
        .with_collection("default")
        .with_language("es-ES")
        .ignore_language_fallbacks(true);

    let result = common::client(&server)
        .initialize_sync(Some(&options), &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.sync_token().unwrap().as_str(), "filtered");
}

#[tokio::test]
async fn test_init_without_fallback_flag_omits_exact_language() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::init_path()))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Continuation", "A"))
        .mount(&server)
        .await;

    let options = SyncInitOptions::new().with_language("de");
    common::client(&server)
        .initialize_sync(Some(&options), &CancellationToken::new())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let query: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(query, vec![("system.language".to_string(), "de".to_string())]);
}

#[tokio::test]
async fn test_preview_mode_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::init_path()))
        .and(header("Authorization", "Bearer preview-key"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Continuation", "A"))
        .expect(1)
        .mount(&server)
        .await;

    let options = SyncOptionsBuilder::new()
        .environment_id(ENV)
        .use_preview_api("preview-key")
        .custom_endpoint(server.uri())
        .build();
    let client = build_client(&options).unwrap();

    let result = client
        .initialize_sync(None, &CancellationToken::new())
        .await
        .unwrap();
    assert!(result.is_success());
}

#[tokio::test]
async fn test_secure_mode_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::init_path()))
        .and(header("Authorization", "Bearer secure-key"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Continuation", "A"))
        .expect(1)
        .mount(&server)
        .await;

    let options = SyncOptionsBuilder::new()
        .environment_id(ENV)
        .use_secure_api("secure-key")
        .custom_endpoint(server.uri())
        .build();
    let result = build_client(&options)
        .unwrap()
        .initialize_sync(None, &CancellationToken::new())
        .await
        .unwrap();
    assert!(result.is_success());
}

#[tokio::test]
async fn test_public_mode_sends_no_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::init_path()))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Continuation", "A"))
        .mount(&server)
        .await;

    let options = SyncOptionsBuilder::new()
        .environment_id(ENV)
        .custom_endpoint(server.uri())
        .build();
    build_client(&options)
        .unwrap()
        .initialize_sync(None, &CancellationToken::new())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_init_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::init_path()))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "Missing or invalid access token.",
            "request_id": "80000004-0002-fd00-b63f-84710c7967bb",
            "error_code": 6,
            "specific_code": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = common::client(&server)
        .initialize_sync(None, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!result.is_success());
    assert!(result.sync_token().is_none());
    let error = result.error().unwrap();
    assert_eq!(error.message, "Missing or invalid access token.");
    assert_eq!(
        error.request_id.as_deref(),
        Some("80000004-0002-fd00-b63f-84710c7967bb")
    );
    assert_eq!(error.error_code, Some(6));
    assert_eq!(error.specific_code, Some(0));
    assert_eq!(
        error.reason,
        kontent_sync_core::domain::SyncErrorReason::Unauthorized
    );
}
