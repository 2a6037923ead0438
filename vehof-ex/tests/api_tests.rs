//! Integration tests for vehof-ex API endpoints
//!
//! Tests cover:
//! - Health and build info
//! - Status line after import and after a failed import
//! - Stateless video queries, single video lookup, topic counts
//! - Flag set / toggle / clear and list counts
//! - Archive reload and reset
//! - Interactive session: pagination, structured query, debounced search

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method
use vehof_common::db::init::init_database;
use vehof_ex::services::ArchiveSource;
use vehof_ex::{build_router, AppState, ExplorerSettings};

const ARCHIVE: &str = "\
url,title,owner_url,owner,duration,published_date,view_count,subscription_count,tags,gpt_tags,Summary,Format,Topic
https://www.youtube.com/watch?v=aaaaaa1,The Architecture of Malls,,Urbanist,12:00,2021-01-10,\"15,300\",,malls,,,Essay,\"Architecture, Society\"
https://youtu.be/bbbbbb2,How Trains Shaped Cities,,Rail Essays,48:30,2022-06-01,2400000,,,,,Essay,\"Transport, Society\"
https://example.test/lectures/untimed,Untimed Lecture,,Urbanist,,2019-09-09,,,,,,Lecture,Architecture
";

struct TestApp {
    _dir: TempDir,
    state: AppState,
    app: Router,
}

fn settings(page_increment: usize, debounce_ms: u64) -> ExplorerSettings {
    ExplorerSettings {
        batch_size: 500,
        page_increment,
        debounce: Duration::from_millis(debounce_ms),
    }
}

/// Test helper: temp root with an archive, imported and ready to serve
async fn setup_with(archive: Option<&str>, settings: ExplorerSettings) -> TestApp {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("archive.csv");
    if let Some(text) = archive {
        std::fs::write(&csv_path, text).unwrap();
    }
    let pool = init_database(&dir.path().join("vehof.db")).await.unwrap();

    let state = AppState::new(pool, ArchiveSource::file(&csv_path), settings);
    state.startup().await.unwrap();
    let app = build_router(state.clone());

    TestApp {
        _dir: dir,
        state,
        app,
    }
}

async fn setup() -> TestApp {
    setup_with(Some(ARCHIVE), settings(60, 5)).await
}

/// Test helper: Create request without a body
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Create request with a JSON body
fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

fn item_ids(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Health, build info, status
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let test = setup().await;

    let response = test.app.clone().oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "vehof-ex");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let test = setup().await;

    let (status, body) = send(&test.app, test_request("GET", "/api/buildinfo")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["git_hash"].is_string());
    assert!(body["build_profile"].is_string());
}

#[tokio::test]
async fn test_status_after_import() {
    let test = setup().await;

    let (status, body) = send(&test.app, test_request("GET", "/api/status")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Imported 3 videos");
    assert_eq!(body["catalog_count"], 3);
    assert_eq!(body["lists"]["favorites"], 0);
}

#[tokio::test]
async fn test_missing_archive_reports_error_and_keeps_serving() {
    let test = setup_with(None, settings(60, 5)).await;

    let (status, body) = send(&test.app, test_request("GET", "/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["status"].as_str().unwrap().starts_with("Failed to load archive"));
    assert_eq!(body["catalog_count"], 0);

    let (status, body) = send(&test.app, test_request("GET", "/api/videos")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);

    let (status, body) = send(&test.app, test_request("POST", "/api/archive/reload")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "FETCH_FAILED");
}

// =============================================================================
// Videos and topics
// =============================================================================

#[tokio::test]
async fn test_videos_default_query() {
    let test = setup().await;

    let (status, body) = send(&test.app, test_request("GET", "/api/videos")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["list_total"], 3);
    assert_eq!(body["has_more"], false);
    // Newest first
    assert_eq!(item_ids(&body), vec!["bbbbbb2", "aaaaaa1", "https://example.test/lectures/untimed"]);

    let first = &body["items"][0];
    assert_eq!(first["duration_label"], "48:30");
    assert_eq!(first["views_label"], "2.4M");
    assert_eq!(first["favorite"], false);
    assert_eq!(first["thumbnails"]["hq"], "https://i.ytimg.com/vi/bbbbbb2/hqdefault.jpg");
    assert_eq!(first["topics"], json!(["Transport", "Society"]));

    let untimed = &body["items"][2];
    assert!(untimed["thumbnails"].is_null());
    assert_eq!(untimed["duration_label"], "—");
}

#[tokio::test]
async fn test_videos_search_filters_and_limit() {
    let test = setup().await;

    let (_, body) = send(&test.app, test_request("GET", "/api/videos?q=malls&sort=none")).await;
    assert_eq!(item_ids(&body), vec!["aaaaaa1"]);

    let (_, body) = send(
        &test.app,
        test_request("GET", "/api/videos?topics=Architecture&owner=Urbanist&sort=oldest"),
    )
    .await;
    assert_eq!(item_ids(&body), vec!["https://example.test/lectures/untimed", "aaaaaa1"]);

    let (_, body) = send(&test.app, test_request("GET", "/api/videos?durations=short,long")).await;
    assert_eq!(body["total"], 2);

    let (_, body) = send(&test.app, test_request("GET", "/api/videos?limit=1")).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["total"], 3);
    assert_eq!(body["has_more"], true);
}

#[tokio::test]
async fn test_videos_seeded_shuffle_is_reproducible() {
    let test = setup().await;

    let (_, first) = send(&test.app, test_request("GET", "/api/videos?seed=77")).await;
    let (_, second) = send(&test.app, test_request("GET", "/api/videos?seed=77")).await;

    assert_eq!(item_ids(&first), item_ids(&second));
    assert_eq!(first["total"], 3);
}

#[tokio::test]
async fn test_videos_invalid_parameters() {
    let test = setup().await;

    let (status, body) = send(&test.app, test_request("GET", "/api/videos?durations=tiny")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = send(&test.app, test_request("GET", "/api/videos?sort=sideways")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&test.app, test_request("GET", "/api/videos?mode=queue")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_single_video() {
    let test = setup().await;

    let (status, body) = send(&test.app, test_request("GET", "/api/videos/aaaaaa1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "The Architecture of Malls");
    assert_eq!(body["duration_seconds"], 720);

    let (status, body) = send(&test.app, test_request("GET", "/api/videos/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_topics_endpoint() {
    let test = setup().await;

    let (status, body) = send(&test.app, test_request("GET", "/api/topics")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"topic": "Architecture", "count": 2},
            {"topic": "Society", "count": 2},
            {"topic": "Transport", "count": 1}
        ])
    );
}

// =============================================================================
// Flags
// =============================================================================

#[tokio::test]
async fn test_set_and_toggle_flags() {
    let test = setup().await;

    let (status, body) = send(
        &test.app,
        json_request("PUT", "/api/flags/aaaaaa1/favorite", json!({"value": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["favorite"], true);
    assert_eq!(body["watched"], false);

    let (_, body) = send(&test.app, test_request("GET", "/api/videos?mode=favorites")).await;
    assert_eq!(item_ids(&body), vec!["aaaaaa1"]);
    assert_eq!(body["list_total"], 1);
    assert_eq!(body["lists"]["favorites"], 1);

    let (_, body) = send(&test.app, test_request("POST", "/api/flags/aaaaaa1/watch_later/toggle")).await;
    assert_eq!(body["watch_later"], true);
    assert_eq!(body["favorite"], true);

    let (_, body) = send(&test.app, test_request("POST", "/api/flags/aaaaaa1/favorite/toggle")).await;
    assert_eq!(body["favorite"], false);

    let (_, body) = send(&test.app, test_request("GET", "/api/flags")).await;
    assert_eq!(body["flags"].as_array().unwrap().len(), 1);
    assert_eq!(body["lists"], json!({"favorites": 0, "watch_later": 1, "watched": 0}));

    // Durable: a fresh hydrate sees the same row
    test.state.flags.hydrate().await.unwrap();
    assert!(test.state.flags.get("aaaaaa1").await.unwrap().watch_later);
}

#[tokio::test]
async fn test_flag_errors() {
    let test = setup().await;

    let (status, _) = send(&test.app, test_request("POST", "/api/flags/aaaaaa1/liked/toggle")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&test.app, test_request("POST", "/api/flags/unknown/favorite/toggle")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_all_flags() {
    let test = setup().await;
    send(&test.app, test_request("POST", "/api/flags/aaaaaa1/watched/toggle")).await;
    send(&test.app, test_request("POST", "/api/flags/bbbbbb2/favorite/toggle")).await;

    let (status, _) = send(&test.app, test_request("DELETE", "/api/flags")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&test.app, test_request("GET", "/api/flags")).await;
    assert_eq!(body["flags"], json!([]));
    assert_eq!(test.state.annotations.count().await.unwrap(), 0);
}

// =============================================================================
// Archive reload and reset
// =============================================================================

#[tokio::test]
async fn test_reload_current_catalog_writes_nothing() {
    let test = setup().await;

    let (status, body) = send(&test.app, test_request("POST", "/api/archive/reload")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loaded"], false);
    assert_eq!(body["count"], 3);

    let (_, body) = send(&test.app, test_request("GET", "/api/status")).await;
    assert_eq!(body["status"], "Loaded 3 videos");
}

#[tokio::test]
async fn test_reset_clears_flags_and_reimports() {
    let test = setup().await;
    send(&test.app, test_request("POST", "/api/flags/aaaaaa1/favorite/toggle")).await;

    let (status, body) = send(&test.app, test_request("POST", "/api/archive/reset")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loaded"], true);
    assert_eq!(body["count"], 3);

    let (_, body) = send(&test.app, test_request("GET", "/api/status")).await;
    assert_eq!(body["catalog_count"], 3);
    assert_eq!(body["lists"]["favorites"], 0);
    assert_eq!(test.state.annotations.count().await.unwrap(), 0);
}

// =============================================================================
// Interactive session
// =============================================================================

#[tokio::test]
async fn test_session_pagination_grows_and_resets() {
    let test = setup_with(Some(ARCHIVE), settings(2, 5)).await;

    let (_, body) = send(&test.app, test_request("GET", "/api/session")).await;
    assert_eq!(body["visible"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["has_more"], true);

    let (_, body) = send(&test.app, test_request("POST", "/api/session/more")).await;
    assert_eq!(body["visible"], 4);
    assert_eq!(body["items"].as_array().unwrap().len(), 3);
    assert_eq!(body["has_more"], false);

    let (status, body) = send(
        &test.app,
        json_request("PUT", "/api/session/query", json!({"sort": "oldest"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["visible"], 2);
    assert_eq!(body["spec"]["sort"], "oldest");
}

#[tokio::test]
async fn test_session_unchanged_query_keeps_window() {
    let test = setup_with(Some(ARCHIVE), settings(1, 5)).await;
    send(&test.app, test_request("POST", "/api/session/more")).await;

    let (_, body) = send(&test.app, json_request("PUT", "/api/session/query", json!({}))).await;

    assert_eq!(body["visible"], 2);
}

#[tokio::test]
async fn test_session_repeated_shuffle_keeps_seed_and_window() {
    let test = setup_with(Some(ARCHIVE), settings(1, 5)).await;

    let (_, first) = send(
        &test.app,
        json_request("PUT", "/api/session/query", json!({"shuffle": true})),
    )
    .await;
    let seed = first["spec"]["shuffle_seed"].clone();
    assert!(seed.is_u64());

    send(&test.app, test_request("POST", "/api/session/more")).await;
    let (_, again) = send(
        &test.app,
        json_request("PUT", "/api/session/query", json!({"shuffle": true})),
    )
    .await;

    assert_eq!(again["spec"]["shuffle_seed"], seed);
    assert_eq!(again["visible"], 2);

    let (_, off) = send(&test.app, json_request("PUT", "/api/session/query", json!({}))).await;
    assert!(off["spec"]["shuffle_seed"].is_null());
}

#[tokio::test]
async fn test_session_search_applies_text() {
    let test = setup().await;
    send(
        &test.app,
        json_request("PUT", "/api/session/query", json!({"mode": "discover", "sort": "none"})),
    )
    .await;

    let (status, body) = send(
        &test.app,
        json_request("PUT", "/api/session/search", json!({"text": "trains"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["spec"]["text"], "trains");
    assert_eq!(body["spec"]["sort"], Value::Null);
    assert_eq!(item_ids(&body), vec!["bbbbbb2"]);
}

#[tokio::test]
async fn test_session_search_superseded_request_does_not_run() {
    let test = setup_with(Some(ARCHIVE), settings(60, 200)).await;

    let first = send(
        &test.app,
        json_request("PUT", "/api/session/search", json!({"text": "mal"})),
    );
    let second = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        send(
            &test.app,
            json_request("PUT", "/api/session/search", json!({"text": "malls"})),
        )
        .await
    };

    let ((_, first), (_, second)) = tokio::join!(first, second);

    assert_eq!(first, json!({"superseded": true}));
    assert_eq!(second["spec"]["text"], "malls");

    let (_, current) = send(&test.app, test_request("GET", "/api/session")).await;
    assert_eq!(current["spec"]["text"], "malls");
}
