//! Integration tests for the mixer HTTP API
//!
//! Drives the router in-process with `oneshot`, backed by the in-memory
//! device.

use axum::body::Body;
use axum::http::StatusCode;
use http::{Method, Request};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use soundscape_common::config::MixerConfig;
use soundscape_mixer::api::{create_router, AppContext};
use soundscape_mixer::device::MemoryDevice;
use soundscape_mixer::MixEngine;
use std::sync::Arc;
use tower::ServiceExt;

/// Test helper to create a router over a fresh engine
fn setup_test_server() -> (axum::Router, Arc<MixEngine>, MemoryDevice) {
    let device = MemoryDevice::new();
    let engine = Arc::new(MixEngine::new(&MixerConfig::default(), &device));
    let router = create_router(AppContext {
        engine: Arc::clone(&engine),
    });
    (router, engine, device)
}

/// Helper function to make HTTP requests to the test server
async fn make_request(
    app: &axum::Router,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(path);
    let request = match body {
        Some(json_body) => request
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn channel<'a>(state: &'a Value, id: &str) -> &'a Value {
    state["channels"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == id)
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _, _) = setup_test_server();
    let (status, body) = make_request(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "soundscape_mixer");
}

#[tokio::test]
async fn test_state_lists_channels_in_order() {
    let (app, _, _) = setup_test_server();
    let (status, body) = make_request(&app, Method::GET, "/mixer/state", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["master_volume"], 70);
    let ids: Vec<&str> = body["channels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["rain", "wind", "waves", "forest", "coffee", "piano"]);
    assert!(body["channels"]
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["enabled"] == false && c["available"] == true));
}

#[tokio::test]
async fn test_toggle_channel() {
    let (app, engine, _) = setup_test_server();

    let (status, body) = make_request(&app, Method::POST, "/mixer/channels/rain/toggle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["channel_id"], "rain");
    assert_eq!(body["enabled"], true);
    assert!(engine.query_state().await.channel("rain").unwrap().enabled);

    let (_, body) = make_request(&app, Method::POST, "/mixer/channels/rain/toggle", None).await;
    assert_eq!(body["enabled"], false);
}

#[tokio::test]
async fn test_unknown_channel_is_not_found() {
    let (app, _, _) = setup_test_server();

    let (status, body) =
        make_request(&app, Method::POST, "/mixer/channels/thunder/toggle", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["status"].as_str().unwrap().contains("thunder"));

    let (status, _) = make_request(
        &app,
        Method::POST,
        "/mixer/channels/thunder/volume",
        Some(json!({ "volume": 20 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_volume_endpoints_clamp() {
    let (app, _, _) = setup_test_server();

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/mixer/channels/waves/volume",
        Some(json!({ "volume": 180 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["volume"], 100);

    let (status, body) =
        make_request(&app, Method::POST, "/mixer/master", Some(json!({ "volume": -10 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["volume"], 0);

    let (_, state) = make_request(&app, Method::GET, "/mixer/state", None).await;
    assert_eq!(state["master_volume"], 0);
    assert_eq!(channel(&state, "waves")["volume"], 100);
}

#[tokio::test]
async fn test_apply_named_preset() {
    let (app, _, _) = setup_test_server();

    let (status, body) = make_request(&app, Method::GET, "/mixer/presets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["presets"].as_array().unwrap().len(), 4);

    let (status, state) =
        make_request(&app, Method::POST, "/mixer/presets/Seaside/apply", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(channel(&state, "waves")["enabled"], true);
    assert_eq!(channel(&state, "waves")["volume"], 70);
    assert_eq!(channel(&state, "wind")["enabled"], true);
    assert_eq!(channel(&state, "wind")["volume"], 30);
    assert_eq!(channel(&state, "rain")["enabled"], false);

    let (status, _) =
        make_request(&app, Method::POST, "/mixer/presets/Thunderstorm/apply", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_apply_adhoc_preset() {
    let (app, _, _) = setup_test_server();

    let (status, state) = make_request(
        &app,
        Method::POST,
        "/mixer/preset",
        Some(json!({ "entries": [{ "channel": "piano", "volume": 45 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(channel(&state, "piano")["enabled"], true);
    assert_eq!(channel(&state, "piano")["fading"], true);

    let (status, _) = make_request(
        &app,
        Method::POST,
        "/mixer/preset",
        Some(json!({ "entries": [{ "channel": "thunder", "volume": 45 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stop_all_disables_everything() {
    let (app, engine, _) = setup_test_server();
    engine.toggle("rain").await.unwrap();
    engine.toggle("forest").await.unwrap();

    let (status, body) = make_request(&app, Method::POST, "/mixer/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(engine.query_state().await.enabled_ids().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (app, _, device) = setup_test_server();
    device.clear_calls();

    let (status, _) =
        make_request(&app, Method::POST, "/mixer/master", Some(json!({ "level": 3 }))).await;
    assert!(status.is_client_error());
    assert!(device.calls().is_empty());
}
