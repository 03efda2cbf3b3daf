use sqlx::{Row, SqlitePool};
use tastebook_shared::Result;

pub struct RefreshToken {
    pub token: String,
    pub user_id: String,
    pub expires_at: i64,
}

pub async fn create(pool: &SqlitePool, token: &str, user_id: &str, expires_at: i64) -> Result<()> {
    sqlx::query("INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES (?1, ?2, ?3)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Look up an unexpired refresh token.
pub async fn find_valid(pool: &SqlitePool, token: &str) -> Result<Option<RefreshToken>> {
    let row = sqlx::query("SELECT * FROM refresh_tokens WHERE token = ?1 AND expires_at > ?2")
        .bind(token)
        .bind(crate::now())
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => Ok(Some(RefreshToken {
            token: row.try_get("token")?,
            user_id: row.try_get("user_id")?,
            expires_at: row.try_get("expires_at")?,
        })),
        None => Ok(None),
    }
}

pub async fn delete(pool: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = ?1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_for_user(pool: &SqlitePool, user_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
