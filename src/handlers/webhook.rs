use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::errors::AppError;
use crate::models::ChatUpdate;
use crate::services::dialogue;
use crate::state::AppState;

/// Inbound side of the chat transport: one JSON update per request.
/// Returns 200 even when processing fails — the transport would otherwise
/// redeliver the same update forever.
pub async fn chat_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(update): Json<ChatUpdate>,
) -> Result<StatusCode, AppError> {
    // Shared-secret gate; skipped when unset (dev mode).
    if !state.config.webhook_secret.is_empty() {
        let provided = headers
            .get("x-webhook-secret")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if provided != state.config.webhook_secret {
            tracing::warn!("webhook secret mismatch");
            return Err(AppError::Unauthorized);
        }
    }

    let chat_id = update.chat_id;
    if let Err(e) = dialogue::process_update(&state, update).await {
        tracing::error!(chat_id, error = %e, "update processing failed");
        let fallback = "Sorry, something went wrong. Please try again in a moment.";
        if let Err(e) = state.chat.send_message(chat_id, fallback).await {
            tracing::error!(chat_id, error = %e, "failed to send fallback reply");
        }
    }

    Ok(StatusCode::OK)
}
