//! NIP-96 discovery against mocked servers.

mod helpers;

use std::time::Duration;

use helpers::client_for;
use objectify_blossom::{discover, UploadError};

const NIP96: &str = "/.well-known/nostr/nip96.json";

#[tokio::test]
async fn test_discover_skips_failing_server() {
    let mut broken = mockito::Server::new_async().await;
    broken
        .mock("GET", NIP96)
        .with_status(500)
        .create_async()
        .await;

    let mut healthy = mockito::Server::new_async().await;
    healthy
        .mock("GET", NIP96)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"api_url":"https://files.example/api/v2/media","content_types":["image/*"]}"#)
        .create_async()
        .await;

    let servers = vec![broken.url(), healthy.url()];
    let found = discover(&servers, Duration::from_secs(5)).await.unwrap();

    assert_eq!(found.server, healthy.url());
    assert_eq!(found.config.api_url, "https://files.example/api/v2/media");
    assert_eq!(found.config.content_types, vec!["image/*".to_string()]);
}

#[tokio::test]
async fn test_discover_aggregates_failures() {
    let mut missing = mockito::Server::new_async().await;
    missing
        .mock("GET", NIP96)
        .with_status(404)
        .create_async()
        .await;

    let mut delegating = mockito::Server::new_async().await;
    delegating
        .mock("GET", NIP96)
        .with_status(200)
        .with_body(r#"{"api_url":"","delegated_to_url":"https://elsewhere.example"}"#)
        .create_async()
        .await;

    let servers = vec![missing.url(), delegating.url()];
    let err = discover(&servers, Duration::from_secs(5)).await.unwrap_err();

    assert_eq!(err.failures.len(), 2);
    let mut statuses: Vec<&UploadError> = err.failures.iter().map(|(_, e)| e).collect();
    statuses.sort_by_key(|e| matches!(e, UploadError::ResponseParse(_)));
    assert!(matches!(statuses[0], UploadError::ServerRejected { status: 404, .. }));
    assert!(matches!(statuses[1], UploadError::ResponseParse(_)));
}

#[tokio::test]
async fn test_fetch_server_config_directly() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", NIP96)
        .with_status(200)
        .with_body(r#"{"api_url":"https://files.example/upload","supported_nips":[96,98]}"#)
        .create_async()
        .await;

    let config = client_for(&server.url()).fetch_server_config().await.unwrap();
    assert_eq!(config.api_url, "https://files.example/upload");
    assert_eq!(config.supported_nips, vec![96, 98]);
    mock.assert_async().await;
}
