//! Integration tests for retries, per-attempt timeouts and cancellation

use std::time::Duration;

use kontent_sync_core::config::RetryConfig;
use kontent_sync_core::domain::SyncErrorReason;
use kontent_sync_core::usecases::SyncClientError;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_always_503_makes_four_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::delta_path()))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let result = common::client(&server)
        .get_delta("A", &CancellationToken::new())
        .await
        .unwrap();

    assert!(!result.is_success());
    assert_eq!(result.status_code(), 503);
    assert_eq!(result.error().unwrap().reason, SyncErrorReason::ServerError);
    server.verify().await;
}

#[tokio::test]
async fn test_transient_failures_are_absorbed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::delta_path()))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(common::delta_path()))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    common::mount_page(&server, "A", 3, Some("B")).await;

    let result = common::client(&server)
        .get_delta("A", &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.value().items.len(), 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::delta_path()))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let result = common::client(&server)
        .get_delta("A", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.error().unwrap().reason, SyncErrorReason::Unauthorized);
    server.verify().await;
}

#[tokio::test]
async fn test_disabled_policy_surfaces_first_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::delta_path()))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let retry = RetryConfig {
        enabled: false,
        ..common::fast_retry()
    };
    let result = common::client_with_retry(&server, &retry)
        .get_delta("A", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.status_code(), 503);
    server.verify().await;
}

#[tokio::test]
async fn test_slow_attempts_time_out_and_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::delta_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::page_body(1))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let retry = RetryConfig {
        max_retries: 1,
        attempt_timeout_secs: 1,
        ..common::fast_retry()
    };
    let result = common::client_with_retry(&server, &retry)
        .get_delta("A", &CancellationToken::new())
        .await
        .unwrap();

    assert!(!result.is_success());
    assert_eq!(result.status_code(), 0);
    assert_eq!(result.error().unwrap().reason, SyncErrorReason::Timeout);
    server.verify().await;
}

#[tokio::test]
async fn test_cancel_abandons_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::delta_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::page_body(1))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let err = common::client(&server)
        .get_all_delta("A", None, &cancel)
        .await
        .unwrap_err();

    assert_eq!(err, SyncClientError::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
