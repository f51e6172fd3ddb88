//! Health check endpoint
//!
//! Provides a simple health check for monitoring.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Store status: "operational" or "degraded"
    pub store_status: &'static str,
}

/// Health check handler
///
/// Returns 200 OK with service and store status. Store status is "degraded"
/// once any persist attempt has failed; queries keep working from memory in
/// that state, but counters and logs may be stale on disk.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store_status = if state.assistant().store().write_failures() > 0 {
        "degraded"
    } else {
        "operational"
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            store_status,
        }),
    )
}
