use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tastebook_shared::id::new_object_id;
use tastebook_shared::recipe::{Recipe, RecipeInput, RecipeUpdate};
use tastebook_shared::{Error, Result};

fn json_column<T: serde::de::DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw)
        .map_err(|err| Error::Internal(format!("corrupt {column} column: {err}")))
}

fn from_row(row: &SqliteRow) -> Result<Recipe> {
    Ok(Recipe {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        title: row.try_get("title")?,
        ingredients: json_column(row, "ingredients")?,
        instructions: json_column(row, "instructions")?,
        categories: json_column(row, "categories")?,
        servings: row.try_get("servings")?,
        prep_time: row.try_get("prep_time")?,
        utensils: json_column(row, "utensils")?,
        img_url: row.try_get("img_url")?,
        img_public_id: row.try_get("img_public_id")?,
        likes_count: row.try_get("likes_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|err| Error::Internal(err.to_string()))
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Recipe>> {
    let row = sqlx::query("SELECT * FROM recipes WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

/// Case-insensitive exact-title lookup.
pub async fn find_by_strict_title(pool: &SqlitePool, title: &str) -> Result<Option<Recipe>> {
    let row = sqlx::query("SELECT * FROM recipes WHERE title = ?1 COLLATE NOCASE")
        .bind(title)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn find_by_strict_title_excluding(
    pool: &SqlitePool,
    title: &str,
    excluded_id: &str,
) -> Result<Option<Recipe>> {
    let row = sqlx::query("SELECT * FROM recipes WHERE title = ?1 COLLATE NOCASE AND id != ?2")
        .bind(title)
        .bind(excluded_id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

async fn insert_one<'e, E>(executor: E, input: &RecipeInput) -> Result<Recipe>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let now = crate::now();
    let recipe = Recipe {
        id: new_object_id(),
        owner_id: input.owner_id.clone(),
        title: input.title.clone(),
        ingredients: input.ingredients.clone(),
        instructions: input.instructions.clone(),
        categories: input.categories.clone(),
        servings: input.servings,
        prep_time: input.prep_time,
        utensils: input.utensils.clone(),
        img_url: input.img_url.clone(),
        img_public_id: input.img_public_id.clone(),
        likes_count: 0,
        created_at: now,
        updated_at: now,
    };

    let result = sqlx::query(
        "INSERT INTO recipes
         (id, owner_id, title, ingredients, instructions, categories,
          servings, prep_time, utensils, img_url, img_public_id,
          likes_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, ?12, ?13)",
    )
    .bind(&recipe.id)
    .bind(&recipe.owner_id)
    .bind(&recipe.title)
    .bind(to_json(&recipe.ingredients)?)
    .bind(to_json(&recipe.instructions)?)
    .bind(to_json(&recipe.categories)?)
    .bind(recipe.servings)
    .bind(recipe.prep_time)
    .bind(to_json(&recipe.utensils)?)
    .bind(&recipe.img_url)
    .bind(&recipe.img_public_id)
    .bind(recipe.created_at)
    .bind(recipe.updated_at)
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(recipe),
        Err(err) if crate::is_unique_violation(&err) => Err(Error::Conflict(
            "A recipe with this title already exists (case-insensitive check).".to_string(),
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn create(pool: &SqlitePool, input: &RecipeInput) -> Result<Recipe> {
    insert_one(pool, input).await
}

/// Batch insert; all-or-nothing within a single transaction. Per-row
/// triage happens before this call in the bulk importer.
pub async fn insert_many(pool: &SqlitePool, inputs: &[RecipeInput]) -> Result<Vec<Recipe>> {
    let mut tx = pool.begin().await?;
    let mut inserted = Vec::with_capacity(inputs.len());
    for input in inputs {
        inserted.push(insert_one(&mut *tx, input).await?);
    }
    tx.commit().await?;
    Ok(inserted)
}

#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub category: Option<String>,
    pub owner_id: Option<String>,
    pub title_contains: Option<String>,
    pub ascending: bool,
    pub limit: i64,
    pub offset: i64,
}

pub async fn list(pool: &SqlitePool, filter: &RecipeFilter) -> Result<Vec<Recipe>> {
    let mut sql = String::from("SELECT * FROM recipes WHERE 1=1");
    if filter.category.is_some() {
        // categories is a JSON array of strings
        sql.push_str(" AND EXISTS (SELECT 1 FROM json_each(recipes.categories) WHERE json_each.value = ?1)");
    }
    if filter.owner_id.is_some() {
        sql.push_str(" AND owner_id = ?2");
    }
    if filter.title_contains.is_some() {
        sql.push_str(" AND title LIKE ?3");
    }
    sql.push_str(if filter.ascending {
        " ORDER BY created_at ASC"
    } else {
        " ORDER BY created_at DESC"
    });
    sql.push_str(" LIMIT ?4 OFFSET ?5");

    let pattern = filter.title_contains.as_ref().map(|t| format!("%{t}%"));
    let rows = sqlx::query(&sql)
        .bind(filter.category.as_deref().unwrap_or(""))
        .bind(filter.owner_id.as_deref().unwrap_or(""))
        .bind(pattern.as_deref().unwrap_or(""))
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;
    rows.iter().map(from_row).collect()
}

pub async fn update_by_id(
    pool: &SqlitePool,
    id: &str,
    update: &RecipeUpdate,
) -> Result<Option<Recipe>> {
    let Some(existing) = find_by_id(pool, id).await? else {
        return Ok(None);
    };

    let title = update.title.as_deref().unwrap_or(&existing.title);
    let ingredients = update.ingredients.as_ref().unwrap_or(&existing.ingredients);
    let instructions = update
        .instructions
        .as_ref()
        .unwrap_or(&existing.instructions);
    let categories = update.categories.as_ref().unwrap_or(&existing.categories);
    let servings = update.servings.or(existing.servings);
    let prep_time = update.prep_time.or(existing.prep_time);
    let utensils = update.utensils.as_ref().unwrap_or(&existing.utensils);

    let result = sqlx::query(
        "UPDATE recipes SET title = ?1, ingredients = ?2, instructions = ?3,
         categories = ?4, servings = ?5, prep_time = ?6, utensils = ?7,
         updated_at = ?8 WHERE id = ?9",
    )
    .bind(title)
    .bind(to_json(ingredients)?)
    .bind(to_json(instructions)?)
    .bind(to_json(categories)?)
    .bind(servings)
    .bind(prep_time)
    .bind(to_json(utensils)?)
    .bind(crate::now())
    .bind(id)
    .execute(pool)
    .await;

    match result {
        Ok(_) => find_by_id(pool, id).await,
        Err(err) if crate::is_unique_violation(&err) => Err(Error::Conflict(
            "Another recipe already uses this title.".to_string(),
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn set_image(
    pool: &SqlitePool,
    id: &str,
    img_url: Option<&str>,
    img_public_id: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE recipes SET img_url = ?1, img_public_id = ?2, updated_at = ?3 WHERE id = ?4")
        .bind(img_url)
        .bind(img_public_id)
        .bind(crate::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_by_id(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Atomic counter update; never read-modify-write in application code.
pub async fn inc_likes_count(pool: &SqlitePool, id: &str, delta: i64) -> Result<()> {
    sqlx::query("UPDATE recipes SET likes_count = MAX(0, likes_count + ?1) WHERE id = ?2")
        .bind(delta)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM recipes")
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("n")?)
}
