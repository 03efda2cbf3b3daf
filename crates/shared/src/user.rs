use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

use crate::operation::Operation;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Rolling 24h AI-suggestion quota state. The reset policy itself lives in
/// `tastebook-core::quota` so it can be tested against an explicit clock.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiUsage {
    pub count: u32,
    pub last_reset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_preference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_bio: Option<String>,
    pub role: Role,
    pub is_verified: bool,
    pub saved_recipes: Vec<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub ai_usage: AiUsage,
    pub recent_ops: Vec<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_public_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub food_preference: Option<String>,
    #[serde(default)]
    pub short_bio: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
}

/// Partial update payload for `PATCH /users/{id}`. Email, password and
/// role changes go through dedicated flows.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: Option<String>,
    pub food_preference: Option<String>,
    pub short_bio: Option<String>,
}
