use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tastebook_shared::Error;

use crate::error::AppError;
use crate::middleware::Auth;
use crate::routes::AppState;

/// Spends one unit of the caller's daily AI quota before the suggestion
/// handler runs; over-limit requests never reach the generator.
pub async fn quota_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth = request.extensions().get::<Auth>().cloned().ok_or_else(|| {
        AppError(Error::Unauthorized("Authentication required".to_string())).into_response()
    })?;

    tastebook_core::quota::consume(
        &state.pool,
        &auth.user_id,
        state.config.ai.daily_limit,
        tastebook_db::now(),
    )
    .await
    .map_err(|err| AppError(err).into_response())?;

    Ok(next.run(request).await)
}
