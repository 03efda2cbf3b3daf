use sqlx::{Row, SqlitePool};
use tastebook_shared::{Error, Result};

/// Insert a like; a duplicate pair comes back as `Error::Conflict` so the
/// service can treat repeats as idempotent successes.
pub async fn create(pool: &SqlitePool, user_id: &str, recipe_id: &str) -> Result<()> {
    let result = sqlx::query(
        "INSERT INTO likes (user_id, recipe_id, created_at) VALUES (?1, ?2, ?3)",
    )
    .bind(user_id)
    .bind(recipe_id)
    .bind(crate::now())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) if crate::is_unique_violation(&err) => {
            Err(Error::Conflict("Recipe already liked".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn delete(pool: &SqlitePool, user_id: &str, recipe_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM likes WHERE user_id = ?1 AND recipe_id = ?2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn exists(pool: &SqlitePool, user_id: &str, recipe_id: &str) -> Result<bool> {
    let row = sqlx::query("SELECT 1 AS one FROM likes WHERE user_id = ?1 AND recipe_id = ?2")
        .bind(user_id)
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

pub async fn count_for_recipe(pool: &SqlitePool, recipe_id: &str) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM likes WHERE recipe_id = ?1")
        .bind(recipe_id)
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("n")?)
}

pub async fn delete_for_recipe(pool: &SqlitePool, recipe_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM likes WHERE recipe_id = ?1")
        .bind(recipe_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Every recipe id the user has liked, for counter cleanup when the
/// account goes away.
pub async fn list_recipe_ids_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>> {
    let rows = sqlx::query("SELECT recipe_id FROM likes WHERE user_id = ?1")
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    rows.iter()
        .map(|row| row.try_get("recipe_id").map_err(Error::from))
        .collect()
}

pub async fn delete_for_user(pool: &SqlitePool, user_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM likes WHERE user_id = ?1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
