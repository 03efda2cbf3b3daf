use axum::extract::{Extension, Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tastebook_core::ownership::authorize;
use tastebook_core::resolve::normalize_name;
use tastebook_shared::ingredient::IngredientInput;
use tastebook_shared::unit::Unit;
use tastebook_shared::{Error, Result};
use validator::Validate;

use crate::error::AppError;
use crate::middleware::Auth;
use crate::routes::{success, AppState, PageQuery};

fn to_document<T: serde::Serialize>(entity: &T) -> Result<Value> {
    serde_json::to_value(entity).map_err(|err| Error::Internal(err.to_string()))
}

async fn guard_ingredient(state: &AppState, id: &str, auth: &Auth) -> Result<()> {
    let pool = state.pool.clone();
    authorize(
        id,
        move |iid: String| async move {
            let ingredient = tastebook_db::ingredients::find_by_id(&pool, &iid).await?;
            ingredient.as_ref().map(to_document).transpose()
        },
        "ownerId",
        "ingredient",
        &auth.principal(),
    )
    .await
}

#[derive(Debug, Deserialize)]
pub struct IngredientListQuery {
    pub name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<IngredientListQuery>,
) -> std::result::Result<impl IntoResponse, AppError> {
    let page = PageQuery {
        limit: query.limit,
        offset: query.offset,
    };
    let ingredients = tastebook_db::ingredients::list(
        &state.pool,
        query.name.as_deref(),
        page.limit(),
        page.offset(),
    )
    .await?;
    Ok(success(ingredients))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<impl IntoResponse, AppError> {
    let ingredient = tastebook_db::ingredients::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| Error::NotFound("Ingredient not found".to_string()))?;
    Ok(success(ingredient))
}

/// Strict creation: a name collision is a 409, not a silent reuse. The
/// resolve-or-create path belongs to suggestions and imports.
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
    Json(input): Json<IngredientInput>,
) -> std::result::Result<impl IntoResponse, AppError> {
    let input = IngredientInput {
        name: normalize_name(&input.name),
        unit: input.unit,
        owner_id: Some(auth.user_id),
    };
    input.validate()?;

    let ingredient = tastebook_db::ingredients::create(&state.pool, &input).await?;
    Ok(success(ingredient))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientUpdate {
    pub name: Option<String>,
    pub unit: Option<Unit>,
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<Auth>,
    Json(input): Json<IngredientUpdate>,
) -> std::result::Result<impl IntoResponse, AppError> {
    guard_ingredient(&state, &id, &auth).await?;

    let name = input.name.as_deref().map(normalize_name);
    if let Some(name) = &name {
        if name.len() < 2 {
            return Err(Error::BadRequest(
                "name must be at least 2 characters".to_string(),
            )
            .into());
        }
    }

    let ingredient =
        tastebook_db::ingredients::update_by_id(&state.pool, &id, name.as_deref(), input.unit)
            .await?
            .ok_or_else(|| Error::NotFound("Ingredient not found".to_string()))?;
    Ok(success(ingredient))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<Auth>,
) -> std::result::Result<impl IntoResponse, AppError> {
    guard_ingredient(&state, &id, &auth).await?;
    tastebook_db::ingredients::delete_by_id(&state.pool, &id).await?;
    Ok(success(json!({ "deleted": true })))
}
