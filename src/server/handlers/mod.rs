//! HTTP handlers for the server.

pub mod delivery;
pub mod drafts;
pub mod render;

use axum::{extract::State, Json};
use std::sync::Arc;

use super::state::AppState;

/// GET /api/health - liveness check.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "boot_time": state.boot_time,
    }))
}
