// Integration tests for the reqwest transport
//
// An axum router on an ephemeral port plays the appliance.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use owl_panel::dispatch::{Dispatcher, HttpTransport, RequestOptions, Transport};
use owl_panel::PanelError;
use serde_json::{json, Value};

async fn system_stats(headers: HeaderMap) -> Json<Value> {
    let cache_control = headers
        .get("cache-control")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    Json(json!({
        "cpu_percent": 12.5,
        "cpu_temp": 47.0,
        "detection_enable": false,
        "recording_enable": false,
        "timestamp": "2024-05-01 12:30:05",
        "cache_control": cache_control,
    }))
}

async fn update_gps(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"success": true, "echo": body}))
}

async fn stop_recording() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "No recording in progress"})),
    )
}

async fn download_frame() -> Vec<u8> {
    vec![0xff, 0xd8, 0xff, 0xe0]
}

async fn spawn_appliance() -> Result<String> {
    let app = Router::new()
        .route("/api/system_stats", get(system_stats))
        .route("/api/update_gps", post(update_gps))
        .route("/api/recording/stop", post(stop_recording))
        .route("/api/download_frame", post(download_frame));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(format!("http://{}", addr))
}

fn dispatcher(base_url: &str) -> Result<Dispatcher> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(base_url)?);
    Ok(Dispatcher::new(transport, Duration::from_secs(5)))
}

#[tokio::test]
async fn test_get_json_with_no_cache() -> Result<()> {
    let base = spawn_appliance().await?;
    let dispatcher = dispatcher(&base)?;

    let reply = dispatcher
        .send("/api/system_stats", RequestOptions::get())
        .await?;
    let body: Value = reply.json()?;

    assert_eq!(body["cpu_percent"], 12.5);
    assert_eq!(body["cache_control"], "no-cache");
    Ok(())
}

#[tokio::test]
async fn test_post_json_body() -> Result<()> {
    let base = spawn_appliance().await?;
    let dispatcher = dispatcher(&base)?;

    let reply = dispatcher
        .send(
            "/api/update_gps",
            RequestOptions::post().with_json(json!({
                "latitude": 1.5,
                "longitude": 2.5,
                "accuracy": 4.0,
                "timestamp": "2024-05-01T12:30:05.000Z"
            })),
        )
        .await?;
    let body: Value = reply.json()?;

    assert_eq!(body["success"], true);
    assert_eq!(body["echo"]["latitude"], 1.5);
    Ok(())
}

#[tokio::test]
async fn test_binary_body() -> Result<()> {
    let base = spawn_appliance().await?;
    let dispatcher = dispatcher(&base)?;

    let reply = dispatcher
        .send("/api/download_frame", RequestOptions::post())
        .await?;

    assert_eq!(reply.into_bytes(), vec![0xff, 0xd8, 0xff, 0xe0]);
    Ok(())
}

#[tokio::test]
async fn test_error_status_maps_to_request_failed() -> Result<()> {
    let base = spawn_appliance().await?;
    let dispatcher = dispatcher(&base)?;

    let err = dispatcher
        .send("/api/recording/stop", RequestOptions::post())
        .await
        .unwrap_err();

    assert!(matches!(err, PanelError::RequestFailed { status: 400, .. }));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_appliance() -> Result<()> {
    // Reserve a port, then free it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let dispatcher = dispatcher(&format!("http://{}", addr))?;
    let err = dispatcher
        .send("/api/system_stats", RequestOptions::get())
        .await
        .unwrap_err();

    assert!(matches!(err, PanelError::NetworkUnavailable(_)));
    Ok(())
}
