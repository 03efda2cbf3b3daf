use serde_json::Value;
use tastebook_shared::category::{normalize_categories, FALLBACK_CATEGORY};
use tastebook_shared::recipe::{RecipeInput, RecipeIngredient};
use tastebook_shared::{Error, Result};
use validator::Validate;

use crate::resolve::{resolve_or_create, IngredientStore};

const DEFAULT_SERVINGS: u32 = 1;
const DEFAULT_PREP_TIME: u32 = 30;

/// Turn a loosely-structured AI suggestion into a validated
/// [`RecipeInput`]. Ingredients are resolved (and created when missing)
/// through the store; categories are reconciled against the closed
/// vocabulary; absent scalars get safe defaults. The final schema pass
/// catches anything the generator produced that is still unrepresentable.
///
/// This function never calls the generative service itself.
pub async fn normalize_suggestion<S: IngredientStore + ?Sized>(
    raw: &Value,
    store: &S,
) -> Result<RecipeInput> {
    let Some(entries) = raw.get("ingredients").and_then(Value::as_array) else {
        return Err(Error::BadRequest(
            "Missing or invalid ingredients array".to_string(),
        ));
    };

    let mut ingredients = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                Error::BadRequest("Suggested ingredient is missing a name".to_string())
            })?;
        let quantity = entry.get("quantity").and_then(Value::as_f64).ok_or_else(|| {
            Error::BadRequest(format!(
                "Suggested ingredient '{name}' has a non-numeric quantity"
            ))
        })?;
        let unit = entry.get("unit").and_then(Value::as_str);

        let resolved = resolve_or_create(store, name, unit).await?;
        ingredients.push(RecipeIngredient {
            ingredient_id: resolved.id,
            quantity,
        });
    }

    let mut categories = raw
        .get("categories")
        .and_then(Value::as_array)
        .map(|candidates| normalize_categories(candidates))
        .unwrap_or_default();
    if categories.is_empty() {
        categories.push(FALLBACK_CATEGORY);
    }

    let title = raw
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled recipe")
        .to_string();

    let instructions: Vec<String> = raw
        .get("instructions")
        .and_then(Value::as_array)
        .map(|steps| {
            steps
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let utensils: Vec<String> = raw
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

    let input = RecipeInput {
        title,
        ingredients,
        instructions,
        categories,
        owner_id: None,
        servings: Some(
            raw.get("servings")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(DEFAULT_SERVINGS),
        ),
        prep_time: Some(
            raw.get("prepTime")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(DEFAULT_PREP_TIME),
        ),
        utensils,
        img_url: None,
        img_public_id: None,
    };

    input.validate().map_err(|_| {
        Error::BadRequest("Invalid recipe format after processing".to_string())
    })?;

    Ok(input)
}
