//! Merging history from an in-process HTTP server

use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use qexplore::history::{encode, ResultType};
use qexplore::remote::{merge_from_source, HistorySource, HttpHistorySource};
use qexplore::{Config, Error, HistoryStore, MemoryStore};
use serde_json::{json, Value};

use super::common::fixtures::{record_at, response_json};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}", addr)
}

async fn spawn_history_server(entries: Vec<Value>) -> String {
    let body = json!({"count": entries.len(), "entries": entries});
    let app = Router::new().route(
        "/api/history",
        get(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    );
    serve(app).await
}

fn source_for(url: String, timeout: Duration) -> HttpHistorySource {
    let config = Config {
        server_url: url,
        timeout,
        ..Config::default()
    };
    HttpHistorySource::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_fetch_returns_listing_entries() {
    let url = spawn_history_server(vec![
        response_json("srv-1", 10, ResultType::Attractor),
        response_json("srv-2", 20, ResultType::Power),
    ])
    .await;

    let source = source_for(url, Duration::from_secs(5));
    let entries = source.fetch_history().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], "srv-1");
}

#[tokio::test]
async fn test_sync_merges_server_records() {
    let mut store = HistoryStore::new(MemoryStore::new());
    store.add(record_at("local-old", 5)).unwrap();
    store.add(record_at("shared", 15)).unwrap();

    let url = spawn_history_server(vec![
        encode(&record_at("shared", 15)).unwrap(),
        response_json("srv-new", 25, ResultType::Void),
        json!({"id": "srv-broken", "request": "nope"}),
    ])
    .await;
    let source = source_for(url, Duration::from_secs(5));

    let report = merge_from_source(&mut store, &source).await.unwrap();
    assert_eq!(report.accepted, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.malformed, 1);

    let ids: Vec<&str> = store.list().map(|r| r.id()).collect();
    assert_eq!(ids, ["srv-new", "shared", "local-old"]);

    // A second sync changes nothing
    let again = merge_from_source(&mut store, &source).await.unwrap();
    assert_eq!(again.accepted, 0);
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn test_server_error_leaves_store_untouched() {
    let app = Router::new().route(
        "/api/history",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database locked") }),
    );
    let url = serve(app).await;

    let mut store = HistoryStore::new(MemoryStore::new());
    store.add(record_at("local", 1)).unwrap();

    let err = merge_from_source(&mut store, &source_for(url, Duration::from_secs(5)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Remote(ref msg) if msg.contains("500")));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_timeout_leaves_store_untouched() {
    let app = Router::new().route(
        "/api/history",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Json(json!({"entries": [], "count": 0}))
        }),
    );
    let url = serve(app).await;

    let mut store = HistoryStore::new(MemoryStore::new());
    store.add(record_at("local", 1)).unwrap();

    let err = merge_from_source(&mut store, &source_for(url, Duration::from_millis(200)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Http(ref e) if e.is_timeout()));
    let ids: Vec<&str> = store.list().map(|r| r.id()).collect();
    assert_eq!(ids, ["local"]);
}

#[tokio::test]
async fn test_unreachable_server() {
    let mut store = HistoryStore::new(MemoryStore::new());
    // Port 9 (discard) is closed on test machines
    let source = source_for("http://127.0.0.1:9".into(), Duration::from_secs(2));
    assert!(merge_from_source(&mut store, &source).await.is_err());
    assert!(store.is_empty());
}
