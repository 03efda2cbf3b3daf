use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tastebook_shared::category::normalize_categories;
use tastebook_shared::id::is_object_id;
use tastebook_shared::ingredient::{Ingredient, IngredientInput};
use tastebook_shared::recipe::{Recipe, RecipeInput, RecipeIngredient};
use tastebook_shared::unit::normalize_unit;
use tastebook_shared::user::{Role, User};
use tastebook_shared::{Error, Result};
use validator::Validate;

use crate::password::hash_password;
use crate::resolve::{normalize_name, resolve_or_create};

/// One rejected row. `row` is the zero-based input index; batch-level
/// failures carry `row: None`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    pub row: Option<usize>,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Outcome of a bulk import: what went in, what was rejected and why.
/// A row failure never aborts the batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport<T> {
    pub inserted: Vec<T>,
    pub skipped: Vec<SkippedRow>,
}

impl<T> Default for ImportReport<T> {
    fn default() -> Self {
        Self {
            inserted: vec![],
            skipped: vec![],
        }
    }
}

fn skip(skipped: &mut Vec<SkippedRow>, row: usize, reason: String, data: &Value) {
    skipped.push(SkippedRow {
        row: Some(row),
        reason,
        data: Some(data.clone()),
    });
}

/// Resolve one raw ingredient entry of a recipe row to `(id, quantity)`.
/// Accepts a 24-hex `ingredientId` directly, otherwise resolves/creates by
/// name through the memo table.
async fn resolve_entry(
    pool: &SqlitePool,
    entry: &Value,
    memo: &mut HashMap<String, String>,
) -> Result<RecipeIngredient> {
    let quantity = entry
        .get("quantity")
        .and_then(Value::as_f64)
        .filter(|q| *q > 0.0)
        .ok_or_else(|| {
            Error::BadRequest("ingredient entry is missing a usable quantity".to_string())
        })?;

    if let Some(id) = entry.get("ingredientId").and_then(Value::as_str) {
        if is_object_id(id) {
            return Ok(RecipeIngredient {
                ingredient_id: id.to_string(),
                quantity,
            });
        }
    }

    let name = entry
        .get("ingredientName")
        .or_else(|| entry.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| {
            Error::BadRequest("ingredient entry needs an ingredientId or a name".to_string())
        })?;

    let key = normalize_name(name);
    if let Some(id) = memo.get(&key) {
        return Ok(RecipeIngredient {
            ingredient_id: id.clone(),
            quantity,
        });
    }

    let unit = entry.get("unit").and_then(Value::as_str);
    let resolved = resolve_or_create(pool, name, unit).await?;
    memo.insert(key, resolved.id.clone());
    Ok(RecipeIngredient {
        ingredient_id: resolved.id,
        quantity,
    })
}

async fn normalize_recipe_row(
    pool: &SqlitePool,
    row: &Value,
    owner_id: Option<&str>,
    memo: &mut HashMap<String, String>,
) -> Result<RecipeInput> {
    let Some(entries) = row.get("ingredients").and_then(Value::as_array) else {
        return Err(Error::BadRequest("ingredients must be an array".to_string()));
    };

    let mut ingredients = Vec::with_capacity(entries.len());
    for entry in entries {
        ingredients.push(resolve_entry(pool, entry, memo).await?);
    }

    let title = row
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    let instructions = row
        .get("instructions")
        .and_then(Value::as_array)
        .map(|steps| {
            steps
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let categories = row
        .get("categories")
        .and_then(Value::as_array)
        .map(|candidates| normalize_categories(candidates))
        .unwrap_or_default();

    let utensils = row
        .get("utensils")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    Ok(RecipeInput {
        title,
        ingredients,
        instructions,
        categories,
        owner_id: owner_id.map(str::to_owned),
        servings: row
            .get("servings")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok()),
        prep_time: row
            .get("prepTime")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok()),
        utensils,
        img_url: row
            .get("imgUrl")
            .and_then(Value::as_str)
            .map(str::to_owned),
        img_public_id: None,
    })
}

/// Import raw recipe rows: per-row normalization and validation, then one
/// batch insert of the surviving rows. Missing ingredients are created on
/// the fly; names repeated within the batch hit the memo table instead of
/// the store.
pub async fn import_recipe_rows(
    pool: &SqlitePool,
    rows: &[Value],
    owner_id: Option<&str>,
) -> Result<ImportReport<Recipe>> {
    let mut report = ImportReport::default();
    let mut memo: HashMap<String, String> = HashMap::new();
    let mut valid: Vec<RecipeInput> = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        let input = match normalize_recipe_row(pool, row, owner_id, &mut memo).await {
            Ok(input) => input,
            Err(err) => {
                skip(&mut report.skipped, idx, err.to_string(), row);
                continue;
            }
        };
        if let Err(err) = input.validate() {
            skip(
                &mut report.skipped,
                idx,
                format!("validation failed: {err}"),
                row,
            );
            continue;
        }
        valid.push(input);
    }

    if !valid.is_empty() {
        match tastebook_db::recipes::insert_many(pool, &valid).await {
            Ok(inserted) => report.inserted = inserted,
            Err(err) => {
                tracing::warn!(error = %err, "recipe batch insert failed");
                report.skipped.push(SkippedRow {
                    row: None,
                    reason: format!("batch insert failed: {err}"),
                    data: None,
                });
            }
        }
    }

    Ok(report)
}

/// Import raw ingredient rows. Rows are inserted one at a time so a
/// duplicate name skips just that row instead of poisoning the batch.
pub async fn import_ingredient_rows(
    pool: &SqlitePool,
    rows: &[Value],
    owner_id: Option<&str>,
) -> Result<ImportReport<Ingredient>> {
    let mut report = ImportReport::default();

    for (idx, row) in rows.iter().enumerate() {
        let Some(name) = row
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
        else {
            skip(
                &mut report.skipped,
                idx,
                "ingredient name is required".to_string(),
                row,
            );
            continue;
        };

        let input = IngredientInput {
            name: normalize_name(name),
            unit: normalize_unit(row.get("unit").and_then(Value::as_str)),
            owner_id: owner_id.map(str::to_owned),
        };
        if let Err(err) = input.validate() {
            skip(
                &mut report.skipped,
                idx,
                format!("validation failed: {err}"),
                row,
            );
            continue;
        }

        // Any store failure stays confined to its row.
        match tastebook_db::ingredients::create(pool, &input).await {
            Ok(created) => report.inserted.push(created),
            Err(err) if err.is_conflict() => {
                skip(&mut report.skipped, idx, "already exists".to_string(), row);
            }
            Err(err) => {
                tracing::warn!(error = %err, row = idx, "ingredient row insert failed");
                skip(&mut report.skipped, idx, err.to_string(), row);
            }
        }
    }

    Ok(report)
}

/// Import raw user rows. Passwords are hashed before insertion; duplicate
/// emails are skipped per row.
pub async fn import_user_rows(pool: &SqlitePool, rows: &[Value]) -> Result<ImportReport<User>> {
    let mut report = ImportReport::default();

    for (idx, row) in rows.iter().enumerate() {
        let name = row.get("name").and_then(Value::as_str).unwrap_or_default();
        let email = row.get("email").and_then(Value::as_str).unwrap_or_default();
        let password = row
            .get("password")
            .and_then(Value::as_str)
            .unwrap_or_default();

        if name.is_empty() || email.is_empty() || password.len() < 8 {
            skip(
                &mut report.skipped,
                idx,
                "name, email and a password of at least 8 characters are required".to_string(),
                row,
            );
            continue;
        }

        let role = row
            .get("role")
            .and_then(Value::as_str)
            .and_then(|r| r.parse::<Role>().ok())
            .unwrap_or_default();

        let password_hash = match hash_password(password) {
            Ok(hash) => hash,
            Err(err) => {
                skip(&mut report.skipped, idx, err.to_string(), row);
                continue;
            }
        };

        let new_user = tastebook_db::users::NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            food_preference: row
                .get("foodPreference")
                .and_then(Value::as_str)
                .map(str::to_owned),
            short_bio: row
                .get("shortBio")
                .and_then(Value::as_str)
                .map(str::to_owned),
            role,
            is_verified: row
                .get("isVerified")
                .map(|v| v.as_bool().unwrap_or(v.as_str() == Some("true")))
                .unwrap_or(false),
        };

        match tastebook_db::users::create(pool, &new_user).await {
            Ok(created) => report.inserted.push(created),
            Err(err) if err.is_conflict() => {
                skip(&mut report.skipped, idx, "email already exists".to_string(), row);
            }
            Err(err) => {
                tracing::warn!(error = %err, row = idx, "user row insert failed");
                skip(&mut report.skipped, idx, err.to_string(), row);
            }
        }
    }

    Ok(report)
}
