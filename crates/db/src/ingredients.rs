use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tastebook_shared::id::new_object_id;
use tastebook_shared::ingredient::{Ingredient, IngredientInput};
use tastebook_shared::unit::Unit;
use tastebook_shared::{Error, Result};

fn from_row(row: &SqliteRow) -> Result<Ingredient> {
    let unit: String = row.try_get("unit")?;
    Ok(Ingredient {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        unit: Unit::from_str(&unit).unwrap_or_default(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Ingredient>> {
    let row = sqlx::query("SELECT * FROM ingredients WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

/// Case-insensitive exact-name lookup.
pub async fn find_by_strict_name(pool: &SqlitePool, name: &str) -> Result<Option<Ingredient>> {
    let row = sqlx::query("SELECT * FROM ingredients WHERE name = ?1 COLLATE NOCASE")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

/// Insert a new ingredient. A uniqueness violation on the name index comes
/// back as `Error::Conflict` so callers can recover idempotently.
pub async fn create(pool: &SqlitePool, input: &IngredientInput) -> Result<Ingredient> {
    let now = crate::now();
    let ingredient = Ingredient {
        id: new_object_id(),
        owner_id: input.owner_id.clone(),
        name: input.name.clone(),
        unit: input.unit,
        created_at: now,
        updated_at: now,
    };

    let result = sqlx::query(
        "INSERT INTO ingredients (id, owner_id, name, unit, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(&ingredient.id)
    .bind(&ingredient.owner_id)
    .bind(&ingredient.name)
    .bind(ingredient.unit.to_string())
    .bind(ingredient.created_at)
    .bind(ingredient.updated_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(ingredient),
        Err(err) if crate::is_unique_violation(&err) => Err(Error::Conflict(
            "An ingredient with this name already exists (case-insensitive check).".to_string(),
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn list(
    pool: &SqlitePool,
    name_contains: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Ingredient>> {
    let pattern = name_contains.map(|n| format!("%{n}%"));
    let rows = match &pattern {
        Some(pattern) => {
            sqlx::query(
                "SELECT * FROM ingredients WHERE name LIKE ?1
                 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            )
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query("SELECT * FROM ingredients ORDER BY created_at DESC LIMIT ?1 OFFSET ?2")
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
    };
    rows.iter().map(from_row).collect()
}

pub async fn update_by_id(
    pool: &SqlitePool,
    id: &str,
    name: Option<&str>,
    unit: Option<Unit>,
) -> Result<Option<Ingredient>> {
    let Some(existing) = find_by_id(pool, id).await? else {
        return Ok(None);
    };

    let name = name.unwrap_or(&existing.name);
    let unit = unit.unwrap_or(existing.unit);

    let result = sqlx::query(
        "UPDATE ingredients SET name = ?1, unit = ?2, updated_at = ?3 WHERE id = ?4",
    )
    .bind(name)
    .bind(unit.to_string())
    .bind(crate::now())
    .bind(id)
    .execute(pool)
    .await;

    match result {
        Ok(_) => find_by_id(pool, id).await,
        Err(err) if crate::is_unique_violation(&err) => Err(Error::Conflict(
            "Another ingredient already uses this name.".to_string(),
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn delete_by_id(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM ingredients WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Which of `ids` do not reference a stored ingredient.
pub async fn missing_ids(pool: &SqlitePool, ids: &[String]) -> Result<Vec<String>> {
    let mut missing = Vec::new();
    for id in ids {
        if find_by_id(pool, id).await?.is_none() {
            missing.push(id.clone());
        }
    }
    Ok(missing)
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM ingredients")
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("n")?)
}
