use std::fmt::Write as _;

use axum::extract::{Extension, Path, State};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::RngCore;
use serde::Deserialize;
use serde_json::json;
use tastebook_core::password::{hash_password, verify_password};
use tastebook_shared::user::{Role, UserInput};
use tastebook_shared::Error;
use validator::Validate;

use crate::error::AppError;
use crate::jwt::generate_jwt;
use crate::middleware::Auth;
use crate::routes::{success, AppState};

const RESET_TOKEN_TTL_SECS: i64 = 60 * 60;

fn random_token() -> String {
    let mut bytes = [0u8; 24];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(48), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

fn session_cookie(name: &'static str, value: String, max_age_days: i64) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(max_age_days))
        .build()
}

fn clear_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::ZERO)
        .build()
}

/// Issue the access + refresh token pair for `user_id` and put both in the
/// jar. The refresh token is persisted so it can be revoked.
async fn issue_session(
    state: &AppState,
    jar: CookieJar,
    user_id: &str,
    role: Role,
) -> Result<(CookieJar, String), AppError> {
    let token = generate_jwt(
        user_id,
        role,
        &state.config.jwt.secret,
        state.config.jwt.expiration_days,
    )
    .map_err(|err| Error::Internal(err.to_string()))?;

    let refresh = random_token();
    let expires_at = tastebook_db::now() + state.config.jwt.refresh_days * 24 * 60 * 60;
    tastebook_db::tokens::create(&state.pool, &refresh, user_id, expires_at).await?;

    let jar = jar
        .add(session_cookie(
            "auth_token",
            token.clone(),
            state.config.jwt.expiration_days,
        ))
        .add(session_cookie(
            "refresh_token",
            refresh,
            state.config.jwt.refresh_days,
        ));

    Ok((jar, token))
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<UserInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;

    let new_user = tastebook_db::users::NewUser {
        name: input.name,
        email: input.email,
        password_hash: hash_password(&input.password)?,
        food_preference: input.food_preference,
        short_bio: input.short_bio,
        // Public registration never grants roles or verification.
        role: Role::User,
        is_verified: false,
    };

    let user = tastebook_db::users::create(&state.pool, &new_user).await?;
    let (jar, token) = issue_session(&state, jar, &user.id, user.role).await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok((jar, success(json!({ "user": user, "token": token }))))
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<impl IntoResponse, AppError> {
    let user = tastebook_db::users::find_by_email(&state.pool, &input.email).await?;

    // Same failure for wrong email and wrong password.
    let Some(user) = user.filter(|u| verify_password(&input.password, &u.password_hash)) else {
        return Err(Error::Unauthorized("Invalid email or password".to_string()).into());
    };

    let (jar, token) = issue_session(&state, jar, &user.id, user.role).await?;
    Ok((jar, success(json!({ "user": user, "token": token }))))
}

pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let Some(cookie) = jar.get("refresh_token") else {
        return Err(Error::Unauthorized("Missing refresh token".to_string()).into());
    };

    let stored = tastebook_db::tokens::find_valid(&state.pool, cookie.value())
        .await?
        .ok_or_else(|| Error::Unauthorized("Invalid or expired refresh token".to_string()))?;

    let user = tastebook_db::users::find_by_id(&state.pool, &stored.user_id)
        .await?
        .ok_or_else(|| Error::Unauthorized("Invalid or expired refresh token".to_string()))?;

    // Rotate: the presented token is single-use.
    tastebook_db::tokens::delete(&state.pool, &stored.token).await?;
    let (jar, token) = issue_session(&state, jar, &user.id, user.role).await?;

    Ok((jar, success(json!({ "token": token }))))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = jar.get("refresh_token") {
        tastebook_db::tokens::delete(&state.pool, cookie.value()).await?;
    }

    let jar = jar
        .add(clear_cookie("auth_token"))
        .add(clear_cookie("refresh_token"));
    Ok((jar, success(json!({ "loggedOut": true }))))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<Auth>,
) -> Result<impl IntoResponse, AppError> {
    let user = tastebook_db::users::find_by_id(&state.pool, &auth.user_id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
    Ok(success(user))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordInput {
    pub email: String,
}

/// Always answers success so the endpoint cannot be used to probe for
/// registered addresses.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordInput>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(user) = tastebook_db::users::find_by_email(&state.pool, &input.email).await? {
        let token = random_token();
        let expires_at = tastebook_db::now() + RESET_TOKEN_TTL_SECS;
        tastebook_db::users::set_reset_token(&state.pool, &user.id, &token, expires_at).await?;

        if let Err(err) =
            crate::email::send_password_reset_email(&user.email, &token, &state.config.email).await
        {
            tracing::warn!(error = %err, "reset email could not be prepared");
        }
    }

    Ok(success(
        json!({ "message": "If that account exists, a reset email is on its way" }),
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordInput {
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(input): Json<ResetPasswordInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;

    let user = tastebook_db::users::find_by_reset_token(&state.pool, &token)
        .await?
        .ok_or_else(|| Error::BadRequest("Invalid or expired reset token".to_string()))?;

    tastebook_db::users::update_password(&state.pool, &user.id, &hash_password(&input.password)?)
        .await?;
    tastebook_db::users::clear_reset_token(&state.pool, &user.id).await?;
    // Existing sessions are revoked along with the old password.
    tastebook_db::tokens::delete_for_user(&state.pool, &user.id).await?;

    tracing::info!(user_id = %user.id, "password reset completed");
    Ok(success(json!({ "message": "Password updated" })))
}
