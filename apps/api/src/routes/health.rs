use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/health
/// Returns service status and which model/provider is configured.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "AI Content Transformer API is running",
        "service": "transform-api",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.gateway.model(),
        "aiProvider": "Google",
        "providerConfigured": state.gateway.is_configured(),
    }))
}
