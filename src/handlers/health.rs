use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::state::AppState;

/// Liveness probe for the external supervisor. Pings the store but never
/// touches dialogue state.
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    {
        let db = state.db.lock().unwrap();
        db.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    }
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
