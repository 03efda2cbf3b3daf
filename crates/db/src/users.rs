use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tastebook_shared::id::new_object_id;
use tastebook_shared::operation::{push_bounded, Operation};
use tastebook_shared::user::{AiUsage, Role, User, UserUpdate};
use tastebook_shared::{Error, Result};

fn json_column<T: serde::de::DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw)
        .map_err(|err| Error::Internal(format!("corrupt {column} column: {err}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|err| Error::Internal(err.to_string()))
}

fn from_row(row: &SqliteRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        food_preference: row.try_get("food_preference")?,
        short_bio: row.try_get("short_bio")?,
        role: Role::from_str(&role).unwrap_or_default(),
        is_verified: row.try_get::<i64, _>("is_verified")? != 0,
        saved_recipes: json_column(row, "saved_recipes")?,
        followers_count: row.try_get("followers_count")?,
        following_count: row.try_get("following_count")?,
        ai_usage: json_column(row, "ai_usage")?,
        recent_ops: json_column(row, "recent_ops")?,
        img_url: row.try_get("img_url")?,
        img_public_id: row.try_get("img_public_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE email = ?1 COLLATE NOCASE")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub food_preference: Option<String>,
    pub short_bio: Option<String>,
    pub role: Role,
    pub is_verified: bool,
}

/// Insert a new account; a duplicate email comes back as `Error::Conflict`.
pub async fn create(pool: &SqlitePool, new_user: &NewUser) -> Result<User> {
    let now = crate::now();
    let user = User {
        id: new_object_id(),
        name: new_user.name.clone(),
        email: new_user.email.clone(),
        password_hash: new_user.password_hash.clone(),
        food_preference: new_user.food_preference.clone(),
        short_bio: new_user.short_bio.clone(),
        role: new_user.role,
        is_verified: new_user.is_verified,
        saved_recipes: vec![],
        followers_count: 0,
        following_count: 0,
        ai_usage: AiUsage::default(),
        recent_ops: vec![],
        img_url: None,
        img_public_id: None,
        created_at: now,
        updated_at: now,
    };

    let result = sqlx::query(
        "INSERT INTO users
         (id, name, email, password_hash, food_preference, short_bio, role,
          is_verified, saved_recipes, followers_count, following_count,
          ai_usage, recent_ops, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, '[]', 0, 0, ?9, '[]', ?10, ?11)",
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.food_preference)
    .bind(&user.short_bio)
    .bind(user.role.to_string())
    .bind(user.is_verified as i64)
    .bind(to_json(&user.ai_usage)?)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(user),
        Err(err) if crate::is_unique_violation(&err) => {
            Err(Error::Conflict("Email already exists".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn list(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<User>> {
    let rows = sqlx::query("SELECT * FROM users ORDER BY created_at DESC LIMIT ?1 OFFSET ?2")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    rows.iter().map(from_row).collect()
}

pub async fn update_by_id(
    pool: &SqlitePool,
    id: &str,
    update: &UserUpdate,
) -> Result<Option<User>> {
    let Some(existing) = find_by_id(pool, id).await? else {
        return Ok(None);
    };

    let name = update.name.as_deref().unwrap_or(&existing.name);
    let food_preference = update
        .food_preference
        .as_deref()
        .or(existing.food_preference.as_deref());
    let short_bio = update
        .short_bio
        .as_deref()
        .or(existing.short_bio.as_deref());

    sqlx::query(
        "UPDATE users SET name = ?1, food_preference = ?2, short_bio = ?3,
         updated_at = ?4 WHERE id = ?5",
    )
    .bind(name)
    .bind(food_preference)
    .bind(short_bio)
    .bind(crate::now())
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id).await
}

pub async fn update_password(pool: &SqlitePool, id: &str, password_hash: &str) -> Result<()> {
    sqlx::query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(password_hash)
        .bind(crate::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_image(
    pool: &SqlitePool,
    id: &str,
    img_url: Option<&str>,
    img_public_id: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE users SET img_url = ?1, img_public_id = ?2, updated_at = ?3 WHERE id = ?4")
        .bind(img_url)
        .bind(img_public_id)
        .bind(crate::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_by_id(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Add `recipe_id` to the saved set. The set lives in a JSON column, so
/// the mutation runs read-modify-write inside one transaction.
pub async fn add_saved_recipe(pool: &SqlitePool, user_id: &str, recipe_id: &str) -> Result<()> {
    let mut tx = pool.begin().await?;
    let row = sqlx::query("SELECT saved_recipes FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(row) = row else {
        return Ok(());
    };
    let mut saved: Vec<String> = json_column(&row, "saved_recipes")?;
    if !saved.iter().any(|id| id == recipe_id) {
        saved.push(recipe_id.to_string());
        sqlx::query("UPDATE users SET saved_recipes = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(to_json(&saved)?)
            .bind(crate::now())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn remove_saved_recipe(pool: &SqlitePool, user_id: &str, recipe_id: &str) -> Result<()> {
    let mut tx = pool.begin().await?;
    let row = sqlx::query("SELECT saved_recipes FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(row) = row else {
        return Ok(());
    };
    let mut saved: Vec<String> = json_column(&row, "saved_recipes")?;
    let before = saved.len();
    saved.retain(|id| id != recipe_id);
    if saved.len() != before {
        sqlx::query("UPDATE users SET saved_recipes = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(to_json(&saved)?)
            .bind(crate::now())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Atomic follower/following counter updates.
pub async fn inc_followers_count(pool: &SqlitePool, id: &str, delta: i64) -> Result<()> {
    sqlx::query("UPDATE users SET followers_count = MAX(0, followers_count + ?1) WHERE id = ?2")
        .bind(delta)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn inc_following_count(pool: &SqlitePool, id: &str, delta: i64) -> Result<()> {
    sqlx::query("UPDATE users SET following_count = MAX(0, following_count + ?1) WHERE id = ?2")
        .bind(delta)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_ai_usage(pool: &SqlitePool, id: &str, usage: &AiUsage) -> Result<()> {
    sqlx::query("UPDATE users SET ai_usage = ?1 WHERE id = ?2")
        .bind(to_json(usage)?)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Prepend an operation to the bounded recent-ops buffer.
pub async fn record_operation(pool: &SqlitePool, user_id: &str, op: Operation) -> Result<()> {
    let mut tx = pool.begin().await?;
    let row = sqlx::query("SELECT recent_ops FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(row) = row else {
        return Ok(());
    };
    let mut ops: Vec<Operation> = json_column(&row, "recent_ops")?;
    push_bounded(&mut ops, op);
    sqlx::query("UPDATE users SET recent_ops = ?1 WHERE id = ?2")
        .bind(to_json(&ops)?)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

pub async fn set_reset_token(
    pool: &SqlitePool,
    user_id: &str,
    token: &str,
    expires_at: i64,
) -> Result<()> {
    sqlx::query("UPDATE users SET reset_token = ?1, reset_token_expires = ?2 WHERE id = ?3")
        .bind(token)
        .bind(expires_at)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_by_reset_token(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT * FROM users WHERE reset_token = ?1 AND reset_token_expires > ?2",
    )
    .bind(token)
    .bind(crate::now())
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn clear_reset_token(pool: &SqlitePool, user_id: &str) -> Result<()> {
    sqlx::query("UPDATE users SET reset_token = NULL, reset_token_expires = NULL WHERE id = ?1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("n")?)
}
