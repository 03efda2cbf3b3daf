use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::category::Category;
use crate::id::validate_object_id;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    #[validate(custom(function = validate_object_id))]
    pub ingredient_id: String,
    #[validate(range(exclusive_min = 0.0, message = "quantity must be positive"))]
    pub quantity: f64,
}

/// Validated recipe payload, the output shape of the suggestion normalizer
/// and the bulk importer as well as the direct-creation input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInput {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(nested)]
    #[validate(length(min = 1, message = "at least one ingredient is required"))]
    pub ingredients: Vec<RecipeIngredient>,
    #[validate(length(min = 1, message = "at least one instruction is required"))]
    pub instructions: Vec<String>,
    #[validate(length(max = 4, message = "at most four categories are allowed"))]
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub servings: Option<u32>,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub prep_time: Option<u32>,
    #[serde(default)]
    pub utensils: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_public_id: Option<String>,
}

/// Stored recipe record. `title` is unique under case-insensitive
/// comparison. Referenced ingredient ids were validated at creation time
/// (not foreign-key enforced).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub title: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub instructions: Vec<String>,
    pub categories: Vec<Category>,
    pub servings: Option<u32>,
    pub prep_time: Option<u32>,
    pub utensils: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_public_id: Option<String>,
    pub likes_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial update payload for `PATCH /recipes/{id}`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecipeUpdate {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: Option<String>,
    #[validate(nested)]
    pub ingredients: Option<Vec<RecipeIngredient>>,
    pub instructions: Option<Vec<String>>,
    #[validate(length(max = 4, message = "at most four categories are allowed"))]
    pub categories: Option<Vec<Category>>,
    #[validate(range(min = 1))]
    pub servings: Option<u32>,
    #[validate(range(min = 1))]
    pub prep_time: Option<u32>,
    pub utensils: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::new_object_id;
    use validator::Validate;

    fn minimal_input() -> RecipeInput {
        RecipeInput {
            title: "Garlic Bread".to_string(),
            ingredients: vec![RecipeIngredient {
                ingredient_id: new_object_id(),
                quantity: 2.0,
            }],
            instructions: vec!["Toast the bread".to_string()],
            categories: vec![Category::Baked],
            owner_id: None,
            servings: Some(2),
            prep_time: Some(10),
            utensils: vec![],
            img_url: None,
            img_public_id: None,
        }
    }

    #[test]
    fn minimal_recipe_validates() {
        assert!(minimal_input().validate().is_ok());
    }

    #[test]
    fn empty_ingredients_fail() {
        let mut input = minimal_input();
        input.ingredients.clear();
        assert!(input.validate().is_err());
    }

    #[test]
    fn zero_quantity_fails() {
        let mut input = minimal_input();
        input.ingredients[0].quantity = 0.0;
        assert!(input.validate().is_err());
    }

    #[test]
    fn malformed_ingredient_id_fails() {
        let mut input = minimal_input();
        input.ingredients[0].ingredient_id = "not-an-id".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn too_many_categories_fail() {
        let mut input = minimal_input();
        input.categories = vec![
            Category::Vegan,
            Category::Keto,
            Category::Paleo,
            Category::Dessert,
            Category::Breakfast,
        ];
        assert!(input.validate().is_err());
    }
}
