//! HTTP request handlers
//!
//! REST endpoints for mixer control. Unknown channels and presets map to
//! 404; every other input is clamped by the engine rather than rejected.

use crate::api::server::AppContext;
use crate::error::Error;
use crate::playback::MixerSnapshot;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use soundscape_common::config::{PresetConfig, PresetEntry};
use tracing::warn;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    /// 0-100 scale; out-of-range values are clamped
    volume: i32,
}

#[derive(Debug, Serialize)]
pub struct VolumeResponse {
    volume: u8,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    channel_id: String,
    enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct PresetRequest {
    entries: Vec<PresetEntry>,
}

#[derive(Debug, Serialize)]
pub struct PresetListResponse {
    presets: Vec<PresetConfig>,
}

type ApiError = (StatusCode, Json<StatusResponse>);

/// Map an engine error onto an HTTP status
fn api_error(e: Error) -> ApiError {
    let status = match e {
        Error::UnknownChannel(_) | Error::UnknownPreset(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!("Request failed: {}", e);
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "soundscape_mixer".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Mixer Endpoints
// ============================================================================

/// GET /mixer/state - Snapshot of every channel and the master volume
pub async fn get_state(State(ctx): State<AppContext>) -> Json<MixerSnapshot> {
    Json(ctx.engine.query_state().await)
}

/// POST /mixer/channels/:id/toggle - Flip a channel on or off
pub async fn toggle_channel(
    State(ctx): State<AppContext>,
    Path(channel_id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let enabled = ctx.engine.toggle(&channel_id).await.map_err(api_error)?;
    Ok(Json(ToggleResponse {
        channel_id,
        enabled,
    }))
}

/// POST /mixer/channels/:id/volume - Set a channel volume
pub async fn set_channel_volume(
    State(ctx): State<AppContext>,
    Path(channel_id): Path<String>,
    Json(req): Json<VolumeRequest>,
) -> Result<Json<VolumeResponse>, ApiError> {
    let volume = ctx
        .engine
        .set_volume(&channel_id, req.volume)
        .await
        .map_err(api_error)?;
    Ok(Json(VolumeResponse { volume }))
}

/// POST /mixer/master - Set the master volume
pub async fn set_master_volume(
    State(ctx): State<AppContext>,
    Json(req): Json<VolumeRequest>,
) -> Json<VolumeResponse> {
    let volume = ctx.engine.set_master(req.volume).await;
    Json(VolumeResponse { volume })
}

/// POST /mixer/stop - Fade out every channel
pub async fn stop_all(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.engine.stop_all().await;
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Preset Endpoints
// ============================================================================

/// GET /mixer/presets - Preset catalogue
pub async fn list_presets(State(ctx): State<AppContext>) -> Json<PresetListResponse> {
    Json(PresetListResponse {
        presets: ctx.engine.presets().to_vec(),
    })
}

/// POST /mixer/presets/:name/apply - Apply a catalogue preset
pub async fn apply_named_preset(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> Result<Json<MixerSnapshot>, ApiError> {
    ctx.engine
        .apply_named_preset(&name)
        .await
        .map_err(api_error)?;
    Ok(Json(ctx.engine.query_state().await))
}

/// POST /mixer/preset - Apply an ad-hoc preset
pub async fn apply_preset(
    State(ctx): State<AppContext>,
    Json(req): Json<PresetRequest>,
) -> Result<Json<MixerSnapshot>, ApiError> {
    ctx.engine
        .apply_preset(&req.entries)
        .await
        .map_err(api_error)?;
    Ok(Json(ctx.engine.query_state().await))
}
