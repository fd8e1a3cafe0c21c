//! HTTP contract tests for the read API
//!
//! Builds the real router over an in-memory object store and drives it with
//! tower::ServiceExt::oneshot.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use serde_json::{json, Value};
use tower::ServiceExt;

use poll_position::api::{build_http_router, ApiConfig, ApiState};

fn app(store: Option<Arc<dyn ObjectStore>>, strict: bool) -> Router {
    let config = ApiConfig {
        strict_status_codes: strict,
        ..Default::default()
    };
    build_http_router(ApiState::new(store, &config), &config).unwrap()
}

async fn put_json(store: &Arc<dyn ObjectStore>, key: &str, body: Value) {
    store
        .put(&Path::from(key), PutPayload::from(serde_json::to_vec(&body).unwrap()))
        .await
        .unwrap();
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn columnar(rows: &[(&str, i64)]) -> Value {
    json!({
        "columns": [
            {"name": "school", "values": rows.iter().map(|(school, _)| *school).collect::<Vec<_>>()},
            {"name": "rank", "values": rows.iter().map(|(_, rank)| *rank).collect::<Vec<_>>()},
        ]
    })
}

// ---------------------------------------------------------------
// Health
// ---------------------------------------------------------------

#[tokio::test]
async fn test_health_without_storage() {
    let (status, body) = get(app(None, false), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

// ---------------------------------------------------------------
// Error payloads
// ---------------------------------------------------------------

#[tokio::test]
async fn test_unconfigured_storage_returns_error_payload() {
    for uri in ["/api/latest-poll", "/api/latest-poll?season=2024", "/api/polls/2024", "/api/seasons"] {
        let (status, body) = get(app(None, false), uri).await;
        assert_eq!(status, StatusCode::OK, "uri {uri}");
        assert_eq!(body, json!({"error": "S3_BUCKET environment variable not set"}), "uri {uri}");
    }
}

#[tokio::test]
async fn test_empty_store_reports_no_poll_data() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());

    let (status, body) = get(app(Some(store.clone()), false), "/api/latest-poll").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "No poll data found"}));

    let (_, body) = get(app(Some(store.clone()), false), "/api/polls/2024").await;
    assert_eq!(body, json!({"error": "No poll data found for season 2024"}));

    let (_, body) = get(app(Some(store), false), "/api/seasons").await;
    assert_eq!(body, json!({"seasons": []}));
}

#[tokio::test]
async fn test_strict_mode_maps_error_status() {
    let (status, body) = get(app(None, true), "/api/seasons").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());

    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    let (status, body) = get(app(Some(store.clone()), true), "/api/latest-poll").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "No poll data found"}));

    store
        .put(
            &Path::from("cleansed/2024/poll_2024-09-01T00-00-00Z.json"),
            PutPayload::from(b"not json".to_vec()),
        )
        .await
        .unwrap();
    let (status, body) = get(app(Some(store), true), "/api/latest-poll").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("Serialization"));
}

#[tokio::test]
async fn test_corrupt_artifact_is_error_payload_not_failure() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    store
        .put(
            &Path::from("cleansed/2024/poll_2024-09-01T00-00-00Z.json"),
            PutPayload::from(br#"{"columns": "nope"}"#.to_vec()),
        )
        .await
        .unwrap();

    let (status, body) = get(app(Some(store), false), "/api/latest-poll").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].is_string());
}

// ---------------------------------------------------------------
// Latest poll
// ---------------------------------------------------------------

#[tokio::test]
async fn test_latest_poll_without_season_is_bare_array() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    put_json(&store, "cleansed/2024/poll_2024-09-01T00-00-00Z.json", columnar(&[("Texas", 1), ("Georgia", 2)])).await;

    let (status, body) = get(app(Some(store), false), "/api/latest-poll").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"school": "Texas", "rank": 1},
            {"school": "Georgia", "rank": 2}
        ])
    );
}

#[tokio::test]
async fn test_latest_poll_with_season_wraps_rows() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    put_json(&store, "cleansed/2023/poll_2023-12-01T00-00-00Z.json", columnar(&[("Michigan", 1)])).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    put_json(&store, "cleansed/2024/poll_2024-09-01T00-00-00Z.json", columnar(&[("Texas", 1)])).await;

    let (_, body) = get(app(Some(store.clone()), false), "/api/latest-poll?season=2023").await;
    assert_eq!(body, json!({"season": 2023, "data": [{"school": "Michigan", "rank": 1}]}));

    let (_, body) = get(app(Some(store.clone()), false), "/api/latest-poll").await;
    assert_eq!(body, json!([{"school": "Texas", "rank": 1}]));

    let (_, body) = get(app(Some(store), false), "/api/latest-poll?season=2022").await;
    assert_eq!(body, json!({"error": "No poll data found"}));
}

#[tokio::test]
async fn test_latest_poll_null_fills_ragged_columns() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    put_json(
        &store,
        "cleansed/2024/poll_2024-09-01T00-00-00Z.json",
        json!({"columns": [{"name": "a", "values": [1, 2, 3]}, {"name": "b", "values": [10]}]}),
    )
    .await;

    let (_, body) = get(app(Some(store), false), "/api/latest-poll").await;
    assert_eq!(
        body,
        json!([
            {"a": 1, "b": 10},
            {"a": 2, "b": null},
            {"a": 3, "b": null}
        ])
    );
}

#[tokio::test]
async fn test_latest_poll_passes_through_non_columnar_document() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    put_json(&store, "cleansed/2024/poll_2024-09-01T00-00-00Z.json", json!({"error": "No poll data found"})).await;

    let (_, body) = get(app(Some(store.clone()), false), "/api/latest-poll").await;
    assert_eq!(body, json!({"error": "No poll data found"}));

    // Pass-through is not wrapped even when a season is requested
    let (_, body) = get(app(Some(store), false), "/api/latest-poll?season=2024").await;
    assert_eq!(body, json!({"error": "No poll data found"}));
}

#[tokio::test]
async fn test_latest_poll_ignores_non_poll_keys() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    put_json(&store, "cleansed/2024/poll_2024-09-01T00-00-00Z.json", columnar(&[("Texas", 1)])).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    put_json(&store, "cleansed/2024/summary_2024-09-02T00-00-00Z.json", columnar(&[("Nope", 99)])).await;
    put_json(&store, "cleansed/2024/poll_2024-09-02T00-00-00Z.txt", columnar(&[("Nope", 99)])).await;

    let (_, body) = get(app(Some(store), false), "/api/latest-poll?season=2024").await;
    assert_eq!(body["data"], json!([{"school": "Texas", "rank": 1}]));
}

// ---------------------------------------------------------------
// Listings
// ---------------------------------------------------------------

#[tokio::test]
async fn test_season_polls_lists_metadata_newest_first() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    put_json(&store, "cleansed/2024/poll_2024-09-01T00-00-00Z.json", columnar(&[("Texas", 1)])).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    put_json(&store, "cleansed/2024/poll_2024-09-08T00-00-00Z.json", columnar(&[("Georgia", 1)])).await;
    put_json(&store, "cleansed/2023/poll_2023-12-01T00-00-00Z.json", columnar(&[("Michigan", 1)])).await;

    let (status, body) = get(app(Some(store), false), "/api/polls/2024").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["season"], 2024);

    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["key"], "cleansed/2024/poll_2024-09-08T00-00-00Z.json");
    assert_eq!(files[1]["key"], "cleansed/2024/poll_2024-09-01T00-00-00Z.json");
    for file in files {
        assert!(file["size"].as_u64().unwrap() > 0);
        let modified = file["lastModified"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(modified).is_ok(), "{modified}");
        assert!(file.get("rows").is_none(), "contents must not be returned");
    }
}

#[tokio::test]
async fn test_seasons_skips_non_numeric_partitions() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    put_json(&store, "cleansed/2023/poll_2023-12-01T00-00-00Z.json", columnar(&[])).await;
    put_json(&store, "cleansed/2024/poll_2024-09-01T00-00-00Z.json", columnar(&[])).await;
    put_json(&store, "cleansed/notyear/poll_2024-09-01T00-00-00Z.json", columnar(&[])).await;
    put_json(&store, "raw/2025/rankings_2025-09-01T00-00-00Z.json", json!([])).await;

    let (status, body) = get(app(Some(store), false), "/api/seasons").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"seasons": [2024, 2023]}));
}

#[tokio::test]
async fn test_non_numeric_season_path_is_rejected() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    let resp = app(Some(store), false)
        .oneshot(Request::builder().uri("/api/polls/latest").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
