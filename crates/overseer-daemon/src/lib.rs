// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use overseer_core::{Supervisor, SupervisorError};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared application state for the control HTTP server.
pub struct AppState {
    /// Supervisor owning the worker process record.
    pub supervisor: Supervisor,
    /// Raised by `POST /exit` to begin daemon shutdown.
    pub shutdown: Notify,
}

impl AppState {
    /// Bundle a supervisor with a fresh shutdown signal.
    pub fn new(supervisor: Supervisor) -> Self {
        Self {
            supervisor,
            shutdown: Notify::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// API errors
// ---------------------------------------------------------------------------

/// An API error with HTTP status code and message.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code.
    pub status: StatusCode,
    /// Human-readable error message.
    pub message: String,
}

impl ApiError {
    /// Create a new `ApiError` with the given status and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<SupervisorError> for ApiError {
    /// Every supervisor rejection surfaces as a 400 with the error text.
    fn from(err: SupervisorError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum router with all control routes.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(cmd_status))
        .route("/start", post(cmd_start))
        .route("/stop", post(cmd_stop))
        .route("/log", get(cmd_log))
        .route("/exit", post(cmd_exit))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn cmd_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.supervisor.status().await;
    debug!(target: "overseer.api", %status, "status requested");
    Json(json!({ "status": status }))
}

async fn cmd_start(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pid = match state.supervisor.start().await {
        Ok(pid) => pid,
        Err(err) => {
            warn!(target: "overseer.api", error = %err, "start rejected");
            return Err(err.into());
        }
    };
    info!(target: "overseer.api", pid, "worker started");
    Ok(Json(json!({ "message": "worker started", "pid": pid })))
}

async fn cmd_stop(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    if let Err(err) = state.supervisor.stop().await {
        warn!(target: "overseer.api", error = %err, "stop rejected");
        return Err(err.into());
    }
    info!(target: "overseer.api", "stop signal sent");
    Ok(Json(json!({ "message": "stop signal sent to worker" })))
}

async fn cmd_log(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let logs = state.supervisor.logs().await;
    debug!(target: "overseer.api", bytes = logs.len(), "log requested");
    ([(header::CONTENT_TYPE, "text/plain")], logs)
}

async fn cmd_exit(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Stop is best effort here; the daemon goes down either way.
    if let Err(err) = state.supervisor.stop().await {
        debug!(target: "overseer.api", error = %err, "no running worker to stop on exit");
    }
    info!(target: "overseer.api", "exit requested, shutting down");
    state.shutdown.notify_one();
    Json(json!({ "message": "supervisor shutting down" }))
}
