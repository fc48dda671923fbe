//! Integration tests for collection item import

mod common;

use common::{collection, FakeClient};
use cb_cli::api::{AssetRef, RetryPolicy};
use cb_cli::batch::ImportProgress;
use cb_cli::cache::IdCaches;
use cb_cli::commands::import::{import_items, resolve_collection};
use cb_cli::error::CliError;
use cb_cli::models::{Asset, AssetKind};
use serde_json::{json, Value};
use std::time::Duration;

fn items(count: usize) -> Vec<Value> {
    (0..count).map(|i| json!({"temp": i})).collect()
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        initial_interval: Duration::from_millis(1),
        max_interval: Duration::from_millis(2),
        multiplier: 2.0,
    }
}

fn remote_weather() -> Asset {
    let mut asset = collection("weather", Vec::new(), Vec::new());
    if let Asset::Collection(c) = &mut asset {
        c.collection_id = Some("c-1".into());
    }
    asset
}

#[tokio::test]
async fn test_items_sent_in_pages() {
    let client = FakeClient::new();
    let target = AssetRef::new(AssetKind::Collection, "weather").with_id(Some("c-1"));
    let progress = ImportProgress::new(5, "weather", false);

    let inserted = import_items(&client, &fast_retry(), &target, &items(5), 2, &progress)
        .await
        .unwrap();

    assert_eq!(inserted, 5);
    let pages: Vec<usize> = client
        .state
        .lock()
        .unwrap()
        .inserted
        .iter()
        .map(Vec::len)
        .collect();
    assert_eq!(pages, vec![2, 2, 1]);
    assert_eq!(progress.position(), 5);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let client = FakeClient::new();
    client.state.lock().unwrap().insert_failures = 2;
    let target = AssetRef::new(AssetKind::Collection, "weather").with_id(Some("c-1"));
    let progress = ImportProgress::new(3, "weather", false);

    let inserted = import_items(&client, &fast_retry(), &target, &items(3), 10, &progress)
        .await
        .unwrap();

    assert_eq!(inserted, 3);
    assert_eq!(client.calls().len(), 3);
}

#[tokio::test]
async fn test_retries_exhausted_stops_import() {
    let client = FakeClient::new();
    client.state.lock().unwrap().insert_failures = 10;
    let target = AssetRef::new(AssetKind::Collection, "weather").with_id(Some("c-1"));
    let progress = ImportProgress::new(4, "weather", false);

    let result = import_items(&client, &fast_retry(), &target, &items(4), 2, &progress).await;

    assert!(matches!(result, Err(CliError::Network(_))));
    assert_eq!(progress.position(), 0);
}

#[tokio::test]
async fn test_zero_page_size_rejected() {
    let client = FakeClient::new();
    let target = AssetRef::new(AssetKind::Collection, "weather");
    let progress = ImportProgress::new(1, "weather", false);

    let result = import_items(&client, &fast_retry(), &target, &items(1), 0, &progress).await;

    assert!(matches!(result, Err(CliError::Validation(_))));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_resolve_collection_caches_id() {
    let client = FakeClient::new().with_asset(remote_weather());
    let mut caches = IdCaches::in_memory();

    let target = resolve_collection(&client, &mut caches, "weather").await.unwrap();
    assert_eq!(target.ident(), "c-1");
    assert_eq!(caches.id_of(AssetKind::Collection, "weather"), Some("c-1"));

    // The second lookup is served from the cache.
    resolve_collection(&client, &mut caches, "weather").await.unwrap();
    assert_eq!(client.calls(), vec!["get collection weather"]);
}

#[tokio::test]
async fn test_resolve_missing_collection() {
    let client = FakeClient::new();
    let mut caches = IdCaches::in_memory();

    let err = resolve_collection(&client, &mut caches, "absent")
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::NotFound(_)));
    assert!(err.to_string().contains("push it before importing"));
}
