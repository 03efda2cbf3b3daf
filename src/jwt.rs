use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tastebook_shared::user::Role;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

/// Generate an access token. HS256 with the configured secret.
pub fn generate_jwt(
    user_id: &str,
    role: Role,
    secret: &str,
    expiration_days: i64,
) -> Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("Failed to get current time")?
        .as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: now + (expiration_days as usize) * 24 * 60 * 60,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT")
}

/// Validate and decode an access token.
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT")?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_minimum_32_characters_long";

    #[test]
    fn test_generate_and_validate_jwt() {
        let token = generate_jwt("abc123", Role::Admin, SECRET, 7).unwrap();
        let claims = validate_jwt(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "abc123");
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_invalid_secret_fails_validation() {
        let token = generate_jwt("abc123", Role::User, SECRET, 7).unwrap();
        assert!(validate_jwt(&token, "wrong_secret").is_err());
    }
}
