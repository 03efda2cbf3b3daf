use axum::extract::{Extension, Path, Query, State};
use axum::response::IntoResponse;
use serde_json::json;
use tastebook_shared::id::is_object_id;
use tastebook_shared::Error;

use crate::error::AppError;
use crate::middleware::Auth;
use crate::routes::{success, AppState, PageQuery};

/// Idempotent follow; self-follow is rejected outright.
pub async fn follow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<Auth>,
) -> Result<impl IntoResponse, AppError> {
    if !is_object_id(&id) {
        return Err(Error::InvalidInput("Invalid ID".to_string()).into());
    }
    if id.eq_ignore_ascii_case(&auth.user_id) {
        return Err(Error::BadRequest("You cannot follow yourself".to_string()).into());
    }

    tastebook_db::users::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

    match tastebook_db::follows::create(&state.pool, &auth.user_id, &id).await {
        Ok(()) => {
            tastebook_db::users::inc_followers_count(&state.pool, &id, 1).await?;
            tastebook_db::users::inc_following_count(&state.pool, &auth.user_id, 1).await?;
        }
        Err(err) if err.is_conflict() => {}
        Err(err) => return Err(err.into()),
    }

    let followers = tastebook_db::follows::count_followers(&state.pool, &id).await?;
    Ok(success(
        json!({ "following": true, "followersCount": followers }),
    ))
}

/// Idempotent unfollow.
pub async fn unfollow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<Auth>,
) -> Result<impl IntoResponse, AppError> {
    if !is_object_id(&id) {
        return Err(Error::InvalidInput("Invalid ID".to_string()).into());
    }

    tastebook_db::users::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

    if tastebook_db::follows::delete(&state.pool, &auth.user_id, &id).await? {
        tastebook_db::users::inc_followers_count(&state.pool, &id, -1).await?;
        tastebook_db::users::inc_following_count(&state.pool, &auth.user_id, -1).await?;
    }

    let followers = tastebook_db::follows::count_followers(&state.pool, &id).await?;
    Ok(success(
        json!({ "following": false, "followersCount": followers }),
    ))
}

pub async fn followers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ids =
        tastebook_db::follows::list_followers(&state.pool, &id, page.limit(), page.offset())
            .await?;
    Ok(success(ids))
}

pub async fn following(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ids =
        tastebook_db::follows::list_following(&state.pool, &id, page.limit(), page.offset())
            .await?;
    Ok(success(ids))
}
