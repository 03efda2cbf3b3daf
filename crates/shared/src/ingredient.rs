use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::unit::Unit;

/// Stored ingredient record. `name` is unique under case-insensitive
/// comparison; the constraint lives in the store, creation recovers from
/// conflicts instead of locking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub name: String,
    pub unit: Unit,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IngredientInput {
    #[validate(length(min = 2, message = "name must be at least 2 characters"))]
    pub name: String,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub owner_id: Option<String>,
}
