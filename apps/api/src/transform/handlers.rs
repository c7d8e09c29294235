//! Axum route handlers for the Transform API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;

use crate::errors::AppError;
use crate::state::AppState;
use crate::transform::models::TransformResult;

/// POST /api/transform
///
/// Body: `{ "text": string, "transformType": "summarize-ceo" | "expand-job-description" | "formal-tone" }`.
/// The body is taken as raw JSON so that missing or mistyped fields are reported
/// through the gateway's own validation rather than a deserialization rejection.
pub async fn handle_transform(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TransformResult>, AppError> {
    let Json(body) = body.map_err(|rejection| {
        AppError::InvalidInput(format!(
            "Request body must be valid JSON: {}",
            rejection.body_text()
        ))
    })?;

    let result = state.gateway.transform(&body).await?;

    Ok(Json(result))
}
