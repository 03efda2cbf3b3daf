use axum::extract::{Extension, Multipart, Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tastebook_core::ownership::authorize;
use tastebook_db::recipes::RecipeFilter;
use tastebook_shared::operation::Operation;
use tastebook_shared::recipe::{RecipeInput, RecipeUpdate};
use tastebook_shared::{Error, Result};
use validator::Validate;

use crate::error::AppError;
use crate::media::StoredMedia;
use crate::middleware::Auth;
use crate::routes::{success, AppState, PageQuery};

fn to_document<T: serde::Serialize>(entity: &T) -> Result<Value> {
    serde_json::to_value(entity).map_err(|err| Error::Internal(err.to_string()))
}

async fn guard_recipe(state: &AppState, id: &str, auth: &Auth) -> Result<()> {
    let pool = state.pool.clone();
    authorize(
        id,
        move |rid: String| async move {
            let recipe = tastebook_db::recipes::find_by_id(&pool, &rid).await?;
            recipe.as_ref().map(to_document).transpose()
        },
        "ownerId",
        "recipe",
        &auth.principal(),
    )
    .await
}

/// Reject payloads pointing at ingredients that do not exist. Ids are
/// schema-validated already; this checks referents.
async fn check_ingredient_refs(state: &AppState, input: &RecipeInput) -> Result<()> {
    let ids: Vec<String> = input
        .ingredients
        .iter()
        .map(|entry| entry.ingredient_id.clone())
        .collect();
    let missing = tastebook_db::ingredients::missing_ids(&state.pool, &ids).await?;
    if !missing.is_empty() {
        return Err(Error::BadRequest(format!(
            "Unknown ingredient ids: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

async fn record_op(state: &AppState, auth: &Auth, kind: &str, recipe_id: &str, summary: String) {
    let op = Operation {
        kind: kind.to_string(),
        resource: "recipe".to_string(),
        resource_id: recipe_id.to_string(),
        summary,
        created_at: tastebook_db::now(),
    };
    // The activity log is best effort; a write failure is not the caller's
    // problem.
    if let Err(err) = tastebook_db::users::record_operation(&state.pool, &auth.user_id, op).await {
        tracing::warn!(error = %err, "failed to record operation");
    }
}

#[derive(Debug, Deserialize)]
pub struct RecipeListQuery {
    pub category: Option<String>,
    pub owner: Option<String>,
    pub title: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<RecipeListQuery>,
) -> std::result::Result<impl IntoResponse, AppError> {
    let page = PageQuery {
        limit: query.limit,
        offset: query.offset,
    };
    let filter = RecipeFilter {
        category: query.category,
        owner_id: query.owner,
        title_contains: query.title,
        ascending: query.sort.as_deref() == Some("asc"),
        limit: page.limit(),
        offset: page.offset(),
    };
    let recipes = tastebook_db::recipes::list(&state.pool, &filter).await?;
    Ok(success(recipes))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<impl IntoResponse, AppError> {
    let recipe = tastebook_db::recipes::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| Error::NotFound("Recipe not found".to_string()))?;
    Ok(success(recipe))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
    Json(mut input): Json<RecipeInput>,
) -> std::result::Result<impl IntoResponse, AppError> {
    input.validate()?;
    check_ingredient_refs(&state, &input).await?;
    input.owner_id = Some(auth.user_id.clone());

    let recipe = tastebook_db::recipes::create(&state.pool, &input).await?;
    record_op(
        &state,
        &auth,
        "create",
        &recipe.id,
        format!("Created recipe '{}'", recipe.title),
    )
    .await;
    Ok(success(recipe))
}

/// AI flow: the quota middleware has already charged this request; fetch a
/// raw suggestion, normalize it (creating any missing ingredients), then
/// persist it for the caller.
pub async fn suggested(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
) -> std::result::Result<impl IntoResponse, AppError> {
    let raw = state.suggestions.suggest().await?;

    let mut input = tastebook_core::suggestion::normalize_suggestion(&raw, &state.pool).await?;
    input.owner_id = Some(auth.user_id.clone());

    let recipe = tastebook_db::recipes::create(&state.pool, &input).await?;
    record_op(
        &state,
        &auth,
        "suggest",
        &recipe.id,
        format!("Accepted suggested recipe '{}'", recipe.title),
    )
    .await;
    Ok(success(recipe))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<Auth>,
    Json(input): Json<RecipeUpdate>,
) -> std::result::Result<impl IntoResponse, AppError> {
    guard_recipe(&state, &id, &auth).await?;
    input.validate()?;

    if let Some(entries) = &input.ingredients {
        let ids: Vec<String> = entries.iter().map(|e| e.ingredient_id.clone()).collect();
        let missing = tastebook_db::ingredients::missing_ids(&state.pool, &ids).await?;
        if !missing.is_empty() {
            return Err(Error::BadRequest(format!(
                "Unknown ingredient ids: {}",
                missing.join(", ")
            ))
            .into());
        }
    }

    let recipe = tastebook_db::recipes::update_by_id(&state.pool, &id, &input)
        .await?
        .ok_or_else(|| Error::NotFound("Recipe not found".to_string()))?;
    record_op(
        &state,
        &auth,
        "update",
        &recipe.id,
        format!("Updated recipe '{}'", recipe.title),
    )
    .await;
    Ok(success(recipe))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<Auth>,
) -> std::result::Result<impl IntoResponse, AppError> {
    guard_recipe(&state, &id, &auth).await?;

    let recipe = tastebook_db::recipes::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| Error::NotFound("Recipe not found".to_string()))?;

    if let Some(public_id) = &recipe.img_public_id {
        state.media.remove(public_id).await?;
    }
    tastebook_db::likes::delete_for_recipe(&state.pool, &id).await?;
    tastebook_db::recipes::delete_by_id(&state.pool, &id).await?;

    record_op(
        &state,
        &auth,
        "delete",
        &id,
        format!("Deleted recipe '{}'", recipe.title),
    )
    .await;
    Ok(success(json!({ "deleted": true })))
}

/// Pull the first file field out of a multipart body and store it.
pub(super) async fn store_uploaded_image(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<StoredMedia> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| Error::BadRequest(format!("Invalid multipart body: {err}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let extension = file_name.rsplit('.').next().unwrap_or("bin").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| Error::BadRequest(format!("Invalid multipart body: {err}")))?;
        if bytes.is_empty() {
            return Err(Error::BadRequest("Uploaded file is empty".to_string()));
        }
        return state.media.store(&extension, bytes.to_vec()).await;
    }
    Err(Error::BadRequest("No file field in upload".to_string()))
}

pub async fn upload_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<Auth>,
    mut multipart: Multipart,
) -> std::result::Result<impl IntoResponse, AppError> {
    guard_recipe(&state, &id, &auth).await?;

    let recipe = tastebook_db::recipes::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| Error::NotFound("Recipe not found".to_string()))?;

    let stored = store_uploaded_image(&state, &mut multipart).await?;

    if let Some(old) = &recipe.img_public_id {
        state.media.remove(old).await?;
    }
    tastebook_db::recipes::set_image(&state.pool, &id, Some(&stored.url), Some(&stored.public_id))
        .await?;

    Ok(success(json!({ "imgUrl": stored.url })))
}
