//! Usage endpoints
//!
//! `GET /usage` reads the current record; `POST /usage/reset` zeroes the
//! counter. Both return the same record shape the UI renders in its quota
//! indicator.

use axum::{Json, extract::State};

use crate::handlers::AppState;
use crate::usage::UsageRecord;

/// GET /usage handler
pub async fn check_handler(State(state): State<AppState>) -> Json<UsageRecord> {
    Json(state.assistant().usage().check().await)
}

/// POST /usage/reset handler
pub async fn reset_handler(State(state): State<AppState>) -> Json<UsageRecord> {
    Json(state.assistant().usage().reset().await)
}
