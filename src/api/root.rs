use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::state::AppState;

/// GET /
pub async fn root() -> Json<&'static str> {
    Json("Hello to my App")
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "environment": state.config.app.environment,
        "active_provider_sessions": state.sessions.len(),
        "timestamp": chrono::Utc::now(),
    }))
}
