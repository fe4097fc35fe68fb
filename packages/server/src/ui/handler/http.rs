//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{infrastructure::dto::websocket::ActiveUsersMessage, ui::state::AppState};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current presence, in the same shape as the broadcast frame.
pub async fn active_users(State(state): State<Arc<AppState>>) -> Json<ActiveUsersMessage> {
    Json(state.presence.current().await)
}
