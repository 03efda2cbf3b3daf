use sqlx::{Row, SqlitePool};
use tastebook_shared::{Error, Result};

/// Insert a follow edge; a duplicate pair comes back as `Error::Conflict`.
pub async fn create(pool: &SqlitePool, follower_id: &str, following_id: &str) -> Result<()> {
    let result = sqlx::query(
        "INSERT INTO follows (follower_id, following_id, created_at) VALUES (?1, ?2, ?3)",
    )
    .bind(follower_id)
    .bind(following_id)
    .bind(crate::now())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) if crate::is_unique_violation(&err) => {
            Err(Error::Conflict("Already following this user".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn delete(pool: &SqlitePool, follower_id: &str, following_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2")
        .bind(follower_id)
        .bind(following_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn exists(pool: &SqlitePool, follower_id: &str, following_id: &str) -> Result<bool> {
    let row =
        sqlx::query("SELECT 1 AS one FROM follows WHERE follower_id = ?1 AND following_id = ?2")
            .bind(follower_id)
            .bind(following_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}

pub async fn count_followers(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM follows WHERE following_id = ?1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("n")?)
}

pub async fn count_following(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM follows WHERE follower_id = ?1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("n")?)
}

pub async fn list_followers(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT follower_id FROM follows WHERE following_id = ?1
         ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    rows.iter()
        .map(|row| row.try_get("follower_id").map_err(Error::from))
        .collect()
}

pub async fn list_following(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT following_id FROM follows WHERE follower_id = ?1
         ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    rows.iter()
        .map(|row| row.try_get("following_id").map_err(Error::from))
        .collect()
}

pub async fn delete_for_user(pool: &SqlitePool, user_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM follows WHERE follower_id = ?1 OR following_id = ?1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
