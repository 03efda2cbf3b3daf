use axum::extract::{Extension, Path, State};
use axum::response::IntoResponse;
use serde_json::json;
use tastebook_shared::id::is_object_id;
use tastebook_shared::operation::Operation;
use tastebook_shared::Error;

use crate::error::AppError;
use crate::middleware::Auth;
use crate::routes::{success, AppState};

async fn record_like_op(state: &AppState, auth: &Auth, kind: &str, recipe_id: &str, title: &str) {
    let op = Operation {
        kind: kind.to_string(),
        resource: "recipe".to_string(),
        resource_id: recipe_id.to_string(),
        summary: format!("{kind} recipe '{title}'"),
        created_at: tastebook_db::now(),
    };
    if let Err(err) = tastebook_db::users::record_operation(&state.pool, &auth.user_id, op).await {
        tracing::warn!(error = %err, "failed to record operation");
    }
}

/// Idempotent like: repeats succeed without touching the counter twice.
pub async fn like(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<Auth>,
) -> Result<impl IntoResponse, AppError> {
    if !is_object_id(&id) {
        return Err(Error::InvalidInput("Invalid ID".to_string()).into());
    }
    let recipe = tastebook_db::recipes::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| Error::NotFound("Recipe not found".to_string()))?;

    match tastebook_db::likes::create(&state.pool, &auth.user_id, &id).await {
        Ok(()) => {
            tastebook_db::recipes::inc_likes_count(&state.pool, &id, 1).await?;
            tastebook_db::users::add_saved_recipe(&state.pool, &auth.user_id, &id).await?;
            record_like_op(&state, &auth, "like", &id, &recipe.title).await;
        }
        Err(err) if err.is_conflict() => {}
        Err(err) => return Err(err.into()),
    }

    let likes_count = tastebook_db::likes::count_for_recipe(&state.pool, &id).await?;
    Ok(success(json!({ "liked": true, "likesCount": likes_count })))
}

/// Idempotent unlike: removing an absent like is a success.
pub async fn unlike(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<Auth>,
) -> Result<impl IntoResponse, AppError> {
    if !is_object_id(&id) {
        return Err(Error::InvalidInput("Invalid ID".to_string()).into());
    }
    let recipe = tastebook_db::recipes::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| Error::NotFound("Recipe not found".to_string()))?;

    if tastebook_db::likes::delete(&state.pool, &auth.user_id, &id).await? {
        tastebook_db::recipes::inc_likes_count(&state.pool, &id, -1).await?;
        tastebook_db::users::remove_saved_recipe(&state.pool, &auth.user_id, &id).await?;
        record_like_op(&state, &auth, "unlike", &id, &recipe.title).await;
    }

    let likes_count = tastebook_db::likes::count_for_recipe(&state.pool, &id).await?;
    Ok(success(json!({ "liked": false, "likesCount": likes_count })))
}
