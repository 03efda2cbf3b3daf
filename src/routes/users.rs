use axum::extract::{Extension, Multipart, Path, Query, State};
use axum::response::IntoResponse;
use serde_json::{json, Value};
use tastebook_core::ownership::authorize;
use tastebook_shared::user::UserUpdate;
use tastebook_shared::{Error, Result};
use validator::Validate;

use crate::error::AppError;
use crate::middleware::Auth;
use crate::routes::{success, AppState, PageQuery};

fn to_document<T: serde::Serialize>(entity: &T) -> Result<Value> {
    serde_json::to_value(entity).map_err(|err| Error::Internal(err.to_string()))
}

/// Ownership guard for user resources: the document's own `id` is the
/// owner field, so users manage themselves and admins manage anyone.
async fn guard_user(state: &AppState, id: &str, auth: &Auth) -> Result<()> {
    let pool = state.pool.clone();
    authorize(
        id,
        move |uid: String| async move {
            let user = tastebook_db::users::find_by_id(&pool, &uid).await?;
            user.as_ref().map(to_document).transpose()
        },
        "id",
        "user",
        &auth.principal(),
    )
    .await
}

pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> std::result::Result<impl IntoResponse, AppError> {
    let users = tastebook_db::users::list(&state.pool, page.limit(), page.offset()).await?;
    Ok(success(users))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<impl IntoResponse, AppError> {
    let user = tastebook_db::users::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
    Ok(success(user))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<Auth>,
    axum::Json(input): axum::Json<UserUpdate>,
) -> std::result::Result<impl IntoResponse, AppError> {
    guard_user(&state, &id, &auth).await?;
    input.validate()?;

    let user = tastebook_db::users::update_by_id(&state.pool, &id, &input)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
    Ok(success(user))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<Auth>,
) -> std::result::Result<impl IntoResponse, AppError> {
    guard_user(&state, &id, &auth).await?;

    let user = tastebook_db::users::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

    // Unwind this account's edges so denormalized counters stay truthful.
    for recipe_id in tastebook_db::likes::list_recipe_ids_for_user(&state.pool, &id).await? {
        tastebook_db::recipes::inc_likes_count(&state.pool, &recipe_id, -1).await?;
    }
    tastebook_db::likes::delete_for_user(&state.pool, &id).await?;

    let following =
        tastebook_db::follows::list_following(&state.pool, &id, i64::MAX, 0).await?;
    for followed_id in following {
        tastebook_db::users::inc_followers_count(&state.pool, &followed_id, -1).await?;
    }
    let followers = tastebook_db::follows::list_followers(&state.pool, &id, i64::MAX, 0).await?;
    for follower_id in followers {
        tastebook_db::users::inc_following_count(&state.pool, &follower_id, -1).await?;
    }
    tastebook_db::follows::delete_for_user(&state.pool, &id).await?;

    tastebook_db::tokens::delete_for_user(&state.pool, &id).await?;

    if let Some(public_id) = &user.img_public_id {
        state.media.remove(public_id).await?;
    }

    tastebook_db::users::delete_by_id(&state.pool, &id).await?;
    tracing::info!(user_id = %id, deleted_by = %auth.user_id, "user deleted");
    Ok(success(json!({ "deleted": true })))
}

pub async fn recent_ops(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<Auth>,
) -> std::result::Result<impl IntoResponse, AppError> {
    // The activity log is private to its owner (and admins).
    guard_user(&state, &id, &auth).await?;

    let user = tastebook_db::users::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
    Ok(success(user.recent_ops))
}

pub async fn upload_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<Auth>,
    mut multipart: Multipart,
) -> std::result::Result<impl IntoResponse, AppError> {
    guard_user(&state, &id, &auth).await?;

    let user = tastebook_db::users::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

    let stored = super::recipes::store_uploaded_image(&state, &mut multipart).await?;

    if let Some(old) = &user.img_public_id {
        state.media.remove(old).await?;
    }
    tastebook_db::users::set_image(&state.pool, &id, Some(&stored.url), Some(&stored.public_id))
        .await?;

    Ok(success(json!({ "imgUrl": stored.url })))
}
