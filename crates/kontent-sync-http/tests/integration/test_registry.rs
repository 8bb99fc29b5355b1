//! Integration tests for building named clients from a configuration file

use std::io::Write;

use kontent_sync_core::config::Config;
use kontent_sync_http::{RegistryError, SyncClientRegistry, DEFAULT_CLIENT_NAME};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{self, ENV};

fn write_config(yaml: &str) -> tempfile::NamedTempFile {
    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(yaml.as_bytes()).unwrap();
    tmp.flush().unwrap();
    tmp
}

#[tokio::test]
async fn test_named_clients_from_yaml_hit_their_endpoints() {
    let public = MockServer::start().await;
    let preview = MockServer::start().await;

    common::mount_page(&public, "A", 2, Some("B")).await;
    Mock::given(method("GET"))
        .and(path(common::delta_path()))
        .and(header("Authorization", "Bearer preview-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::page_body(4)))
        .expect(1)
        .mount(&preview)
        .await;

    let tmp = write_config(&format!(
        r#"
clients:
  default:
    environment_id: {ENV}
    production_endpoint: {public}
  preview:
    environment_id: {ENV}
    api_mode: preview
    api_key: preview-key
    preview_endpoint: {preview}
    retry:
      enabled: false
"#,
        public = public.uri(),
        preview = preview.uri(),
    ));

    let config = Config::load(tmp.path()).unwrap();
    let registry = SyncClientRegistry::from_config(&config).unwrap();
    assert_eq!(
        registry.names().collect::<Vec<_>>(),
        vec![DEFAULT_CLIENT_NAME, "preview"]
    );

    let cancel = CancellationToken::new();
    let default_page = registry
        .default_client()
        .unwrap()
        .get_delta("A", &cancel)
        .await
        .unwrap();
    assert_eq!(default_page.value().items.len(), 2);

    let preview_page = registry
        .get("preview")
        .unwrap()
        .get_delta("A", &cancel)
        .await
        .unwrap();
    assert_eq!(preview_page.value().items.len(), 4);

    preview.verify().await;
}

#[test]
fn test_invalid_entry_fails_registry_construction() {
    let tmp = write_config(
        r#"
clients:
  secure:
    environment_id: 00000000-0000-0000-0000-000000000000
    api_mode: secure
"#,
    );

    let config = Config::load(tmp.path()).unwrap();
    match SyncClientRegistry::from_config(&config).unwrap_err() {
        RegistryError::InvalidConfiguration { name, errors } => {
            assert_eq!(name, "secure");
            assert!(errors.iter().any(|e| e.field == "environment_id"));
            assert!(errors.iter().any(|e| e.field == "api_key"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unknown_client_name() {
    let registry = SyncClientRegistry::from_config(&Config::default()).unwrap();
    assert!(registry.is_empty());
    assert!(matches!(
        registry.default_client(),
        Err(RegistryError::NotRegistered(_))
    ));
}
