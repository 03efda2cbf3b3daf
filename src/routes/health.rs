use axum::extract::State;
use axum::http::StatusCode;

use crate::routes::AppState;

pub async fn health() -> &'static str {
    "OK"
}

/// Readiness probe: verifies the database answers.
pub async fn ready(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        })?;
    Ok("OK")
}
