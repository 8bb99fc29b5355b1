//! Integration tests for delta fetching and multi-page pulls

use kontent_sync_core::domain::{ChangeType, MAX_ITEMS_PER_ENTITY_TYPE};
use kontent_sync_core::usecases::SyncClientError;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

const FULL: usize = MAX_ITEMS_PER_ENTITY_TYPE;

#[derive(Debug, Deserialize)]
struct ItemSystem {
    codename: String,
}

#[derive(Debug, Deserialize)]
struct ItemData {
    system: ItemSystem,
}

#[tokio::test]
async fn test_get_delta_returns_page_and_next_token() {
    let server = MockServer::start().await;
    common::mount_page(&server, "A", 5, Some("B")).await;

    let result = common::client(&server)
        .get_delta("A", &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.sync_token().unwrap().as_str(), "B");
    assert!(!result.has_more_changes());

    let page = result.value();
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.total_changes(), 5);
    assert_eq!(page.items[0].change_type(), ChangeType::Created);
    assert_eq!(page.items[1].change_type(), ChangeType::Updated);

    let data: ItemData = page.items[3].decode_data().unwrap().unwrap();
    assert_eq!(data.system.codename, "item_3");
}

#[tokio::test]
async fn test_get_delta_full_category_reports_more_changes() {
    let server = MockServer::start().await;
    common::mount_page(&server, "A", FULL, Some("B")).await;

    let result = common::client(&server)
        .get_delta("A", &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.has_more_changes());
}

#[tokio::test]
async fn test_get_delta_decodes_every_category() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::delta_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{ "change_type": "deleted" }],
            "assets": [{ "change_type": "changed", "data": { "url": "https://assets/x.png" } }],
            "types": [{ "change_type": "updated", "data": { "system": { "codename": "article" } } }],
            "languages": [{ "change_type": "created", "data": { "system": { "codename": "de" } } }],
            "taxonomies": [{ "change_type": "deleted", "data": null }]
        })))
        .mount(&server)
        .await;

    let result = common::client(&server)
        .get_delta("A", &CancellationToken::new())
        .await
        .unwrap();

    let page = result.value();
    assert_eq!(
        page.category_counts(),
        [
            ("items", 1),
            ("assets", 1),
            ("types", 1),
            ("languages", 1),
            ("taxonomies", 1)
        ]
    );
    assert!(page.items[0].change_type().is_deletion());
    assert!(page.items[0].data().is_none());
    assert_eq!(page.assets[0].change_type(), ChangeType::Changed);
    // A page without a new token is still a success
    assert!(result.sync_token().is_none());
}

#[tokio::test]
async fn test_get_all_delta_follows_continuation_tokens() {
    let server = MockServer::start().await;
    common::mount_page(&server, "A", FULL, Some("B")).await;
    common::mount_page(&server, "B", FULL, Some("C")).await;
    common::mount_page(&server, "C", 7, Some("D")).await;

    let result = common::client(&server)
        .get_all_delta("A", None, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.pages_fetched(), 3);
    assert_eq!(result.total_changes(), 2 * FULL + 7);
    assert_eq!(result.final_sync_token().as_str(), "D");
    assert!(!result.was_limited_by_max_pages());
}

#[tokio::test]
async fn test_get_all_delta_reuses_token_when_page_has_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::delta_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::page_body(FULL)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    common::mount_page(&server, "A", 1, None).await;

    let result = common::client(&server)
        .get_all_delta("A", None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.pages_fetched(), 2);
    assert_eq!(result.final_sync_token().as_str(), "A");

    let tokens: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| {
            r.headers
                .get("x-continuation")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        })
        .collect();
    assert_eq!(tokens, vec!["A", "A"]);
}

#[tokio::test]
async fn test_get_all_delta_respects_max_pages() {
    let server = MockServer::start().await;
    common::mount_page(&server, "A", FULL, Some("B")).await;
    common::mount_page(&server, "B", FULL, Some("C")).await;
    common::mount_page(&server, "C", FULL, Some("D")).await;

    let result = common::client(&server)
        .get_all_delta("A", Some(2), &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.pages_fetched(), 2);
    assert!(result.was_limited_by_max_pages());
    assert_eq!(result.final_sync_token().as_str(), "C");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_all_delta_returns_partial_pages_on_failure() {
    let server = MockServer::start().await;
    common::mount_page(&server, "A", FULL, Some("B")).await;
    Mock::given(method("GET"))
        .and(path(common::delta_path()))
        .and(wiremock::matchers::header("X-Continuation", "B"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "The requested sync session was not found."
        })))
        .mount(&server)
        .await;

    let result = common::client(&server)
        .get_all_delta("A", None, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!result.is_success());
    assert_eq!(result.pages_fetched(), 1);
    assert_eq!(result.responses()[0].items.len(), FULL);
    assert_eq!(result.final_sync_token().as_str(), "B");
    let error = result.error().unwrap();
    assert_eq!(error.message, "The requested sync session was not found.");
    assert_eq!(error.error_code, Some(404));
}

#[tokio::test]
async fn test_blank_token_makes_no_request() {
    let server = MockServer::start().await;
    let client = common::client(&server);

    for token in ["", "   "] {
        let err = client
            .get_delta(token, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncClientError::InvalidArgument(_)));
    }
    let err = client
        .get_all_delta("A", Some(0), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncClientError::InvalidArgument(_)));

    assert!(server.received_requests().await.unwrap().is_empty());
}
