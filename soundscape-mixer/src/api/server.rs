//! HTTP server setup and routing
//!
//! Sets up the Axum HTTP server with mixer control routes and SSE.

use crate::error::{Error, Result};
use crate::playback::MixEngine;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub engine: Arc<MixEngine>,
}

/// Build the router with every mixer route
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))

        // Mixer state and control
        .route("/mixer/state", get(super::handlers::get_state))
        .route("/mixer/channels/:id/toggle", post(super::handlers::toggle_channel))
        .route("/mixer/channels/:id/volume", post(super::handlers::set_channel_volume))
        .route("/mixer/master", post(super::handlers::set_master_volume))
        .route("/mixer/stop", post(super::handlers::stop_all))

        // Presets
        .route("/mixer/presets", get(super::handlers::list_presets))
        .route("/mixer/presets/:name/apply", post(super::handlers::apply_named_preset))
        .route("/mixer/preset", post(super::handlers::apply_preset))

        // SSE event stream
        .route("/events", get(super::sse::event_stream))

        // Attach application context
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server until `shutdown` resolves
pub async fn run<F>(port: u16, engine: Arc<MixEngine>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(AppContext { engine });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
