//! Live Server Tests
//!
//! Binds the router to an ephemeral port and talks to it over HTTP.

use std::net::SocketAddr;

use filehost_cache::{create_router, AppState};
use serde_json::{json, Value};

async fn spawn_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(AppState::in_memory(1000));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_health_over_http() {
    let addr = spawn_server().await;
    let body: Value = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_storage_round_trip_over_http() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    let response = client
        .post(format!("{}/storage/items", base))
        .header("x-user-id", "u7")
        .json(&json!({ "name": "clip.mp4", "mimeType": "video/mp4", "sizeBytes": 4096 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    for expected in [false, true] {
        let stats: Value = client
            .get(format!("{}/storage/stats", base))
            .header("x-user-id", "u7")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats["totalFiles"], 1);
        assert_eq!(stats["fromCache"], expected);
    }

    let cleared: Value = client
        .delete(format!("{}/admin/cache", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared["removed"], 1);
}
