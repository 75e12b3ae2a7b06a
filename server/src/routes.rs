//! HTTP route handlers for the relay server.
//!
//! This module provides the HTTP API endpoints:
//!
//! - `GET /ws` - WebSocket endpoint clients connect and chat through
//! - `GET /health` - Health check endpoint
//!
//! # Architecture
//!
//! All routes share application state through [`AppState`], which contains
//! the configuration, the connection registry, and the server start time for
//! uptime reporting. Authentication happens before the WebSocket upgrade by
//! consuming the `token` query parameter exactly once; the failure is
//! delivered to the client as a close frame with code 1008 so the reason
//! string reaches it over the WebSocket protocol rather than as a rejected
//! HTTP handshake.

use std::sync::Arc;

use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::auth::authenticate;
use crate::config::Config;
use crate::registry::ConnectionRegistry;
use crate::session;

/// Shared application state for all route handlers.
///
/// Cloned per request; the registry and configuration are behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<Config>,

    /// Shared connection registry.
    pub registry: Arc<ConnectionRegistry>,

    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Creates a new application state with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(ConnectionRegistry::new()),
            start_time: Instant::now(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"<Config>")
            .field("registry", &self.registry)
            .field("start_time", &self.start_time)
            .finish()
    }
}

/// Creates the application router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(get_ws))
        .route("/health", get(get_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Query parameters for the WebSocket endpoint.
#[derive(Debug, Deserialize)]
pub struct WsQueryParams {
    /// Authentication token, compared against the configured secret.
    pub token: Option<String>,
}

/// GET /ws - WebSocket chat endpoint.
///
/// # Authentication
///
/// The `token` query parameter must equal the configured secret. A missing
/// or invalid token still upgrades the connection, then immediately closes
/// it with code 1008 and a reason of `"Missing token"` or
/// `"Invalid token"`; no registry entry is created.
///
/// # Protocol
///
/// Once authenticated, the client exchanges JSON text frames per the
/// [`crate::types`] schema: chat messages are fanned out to every connected
/// client (sender included) with a server-assigned UTC timestamp, and
/// presence changes are announced as `user_joined` / `user_left`.
async fn get_ws(
    State(state): State<AppState>,
    Query(params): Query<WsQueryParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let auth = authenticate(params.token.as_deref(), &state.config.secret_token);

    if let Err(ref err) = auth {
        debug!(reason = err.close_reason(), "WebSocket authentication failed");
    }

    ws.on_upgrade(move |socket| session::run(socket, state, auth))
}

/// Response body for health check endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Server status (always "ok" if responding).
    pub status: String,

    /// Number of registered connections.
    pub connections: usize,

    /// Server uptime in seconds.
    pub uptime_seconds: u64,
}

/// GET /health - Health check endpoint.
///
/// Returns server health status and statistics. No authentication required.
async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed();

    Json(HealthResponse {
        status: "ok".to_string(),
        connections: state.registry.len(),
        uptime_seconds: uptime.as_secs(),
    })
}
