use anyhow::Result;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tastebook_core::import::{import_ingredient_rows, import_recipe_rows};
use tastebook_core::password::hash_password;
use tastebook_shared::user::Role;

fn seed_ingredients() -> Vec<Value> {
    vec![
        json!({ "name": "Spaghetti", "unit": "gr" }),
        json!({ "name": "Olive Oil", "unit": "ml" }),
        json!({ "name": "Garlic", "unit": "cloves" }),
        json!({ "name": "Chickpeas", "unit": "gr" }),
        json!({ "name": "Lemon", "unit": "unit" }),
        json!({ "name": "Egg", "unit": "unit" }),
        json!({ "name": "Butter", "unit": "gr" }),
        json!({ "name": "Sugar", "unit": "gr" }),
    ]
}

fn seed_recipes() -> Vec<Value> {
    vec![
        json!({
            "title": "Garlic Spaghetti",
            "ingredients": [
                { "ingredientName": "Spaghetti", "unit": "gr", "quantity": 200 },
                { "ingredientName": "Olive Oil", "unit": "ml", "quantity": 30 },
                { "ingredientName": "Garlic", "unit": "cloves", "quantity": 4 }
            ],
            "instructions": [
                "Boil the spaghetti until al dente",
                "Gently fry sliced garlic in olive oil",
                "Toss the pasta in the garlic oil and serve"
            ],
            "categories": ["pasta", "dinner", "quick-meals"],
            "servings": 2,
            "prepTime": 20,
            "utensils": ["pot", "pan"]
        }),
        json!({
            "title": "Lemon Chickpea Salad",
            "ingredients": [
                { "ingredientName": "Chickpeas", "unit": "gr", "quantity": 250 },
                { "ingredientName": "Lemon", "quantity": 1 },
                { "ingredientName": "Olive Oil", "unit": "ml", "quantity": 20 }
            ],
            "instructions": [
                "Rinse the chickpeas",
                "Whisk lemon juice with olive oil",
                "Combine and season to taste"
            ],
            "categories": ["salad", "vegan", "lunch"],
            "servings": 2,
            "prepTime": 10,
            "utensils": ["bowl"]
        }),
        json!({
            "title": "Butter Cookies",
            "ingredients": [
                { "ingredientName": "Butter", "unit": "gr", "quantity": 120 },
                { "ingredientName": "Sugar", "unit": "gr", "quantity": 80 },
                { "ingredientName": "Egg", "quantity": 1 }
            ],
            "instructions": [
                "Cream the butter and sugar",
                "Mix in the egg",
                "Shape and bake at 180C for 12 minutes"
            ],
            "categories": ["dessert", "baked"],
            "servings": 12,
            "prepTime": 35,
            "utensils": ["bowl", "baking tray"]
        }),
    ]
}

/// Load the built-in demo data through the bulk importer, so seeding obeys
/// the same normalization and skip rules as an admin CSV import. Re-running
/// is harmless: existing rows surface as skips.
pub async fn seed(pool: &SqlitePool) -> Result<()> {
    let ingredients = import_ingredient_rows(pool, &seed_ingredients(), None).await?;
    tracing::info!(
        inserted = ingredients.inserted.len(),
        skipped = ingredients.skipped.len(),
        "seeded ingredients"
    );

    let recipes = import_recipe_rows(pool, &seed_recipes(), None).await?;
    tracing::info!(
        inserted = recipes.inserted.len(),
        skipped = recipes.skipped.len(),
        "seeded recipes"
    );
    for skip in &recipes.skipped {
        tracing::warn!(row = ?skip.row, reason = %skip.reason, "seed row skipped");
    }

    Ok(())
}

/// Create (or report) the administrator account.
pub async fn seed_admin(pool: &SqlitePool, name: &str, email: &str, password: &str) -> Result<()> {
    let new_user = tastebook_db::users::NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: hash_password(password).map_err(|err| anyhow::anyhow!(err.to_string()))?,
        food_preference: None,
        short_bio: None,
        role: Role::Admin,
        is_verified: true,
    };

    match tastebook_db::users::create(pool, &new_user).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, email, "admin account created");
            Ok(())
        }
        Err(err) if err.is_conflict() => {
            tracing::warn!(email, "admin account already exists");
            Ok(())
        }
        Err(err) => Err(anyhow::anyhow!(err.to_string())),
    }
}
