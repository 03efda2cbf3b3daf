use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::error::AppError;
use crate::middleware::Auth;
use crate::routes::{success, AppState};

/// CSV body in, import report out. Rows go through the bulk import
/// normalizer; failures come back per row instead of failing the request.
pub async fn import_recipes(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let rows = crate::imports::read_rows(&body)?;
    let report =
        tastebook_core::import::import_recipe_rows(&state.pool, &rows, Some(&auth.user_id))
            .await?;
    tracing::info!(
        inserted = report.inserted.len(),
        skipped = report.skipped.len(),
        "recipe import finished"
    );
    Ok(success(report))
}

pub async fn import_ingredients(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let rows = crate::imports::read_rows(&body)?;
    let report =
        tastebook_core::import::import_ingredient_rows(&state.pool, &rows, Some(&auth.user_id))
            .await?;
    tracing::info!(
        inserted = report.inserted.len(),
        skipped = report.skipped.len(),
        "ingredient import finished"
    );
    Ok(success(report))
}

pub async fn import_users(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let rows = crate::imports::read_rows(&body)?;
    let report = tastebook_core::import::import_user_rows(&state.pool, &rows).await?;
    tracing::info!(
        inserted = report.inserted.len(),
        skipped = report.skipped.len(),
        "user import finished"
    );
    Ok(success(report))
}

fn csv_download(filename: &str, content: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        content,
    )
}

pub async fn recipes_template() -> impl IntoResponse {
    csv_download("recipes-template.csv", crate::imports::recipes_template())
}

pub async fn ingredients_template() -> impl IntoResponse {
    csv_download(
        "ingredients-template.csv",
        crate::imports::ingredients_template(),
    )
}

pub async fn users_template() -> impl IntoResponse {
    csv_download("users-template.csv", crate::imports::users_template())
}
