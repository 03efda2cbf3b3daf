use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use tastebook_shared::user::Role;
use tastebook_shared::Error;

use crate::error::AppError;
use crate::jwt::validate_jwt;
use crate::routes::AppState;

/// Auth extension with the authenticated principal. The role comes from
/// the user row, not the token, so demotions take effect immediately.
#[derive(Clone, Debug)]
pub struct Auth {
    pub user_id: String,
    pub role: Role,
}

impl Auth {
    pub fn principal(&self) -> tastebook_core::ownership::Principal {
        tastebook_core::ownership::Principal {
            id: self.user_id.clone(),
            role: self.role,
        }
    }
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn unauthorized(message: &str) -> Response {
    AppError(Error::Unauthorized(message.to_string())).into_response()
}

/// Validates the JWT from the `auth_token` cookie (or a bearer header),
/// verifies the account still exists, and injects [`Auth`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match jar
        .get("auth_token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| bearer_token(&req).map(str::to_owned))
    {
        Some(token) => token,
        None => return unauthorized("Authentication required"),
    };

    let claims = match validate_jwt(&token, &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(error = %err, "invalid auth token");
            return unauthorized("Invalid or expired token");
        }
    };

    // Deleted accounts carry valid tokens until expiry; reject them here.
    match tastebook_db::users::find_by_id(&state.pool, &claims.sub).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(Auth {
                user_id: user.id,
                role: user.role,
            });
            next.run(req).await
        }
        Ok(None) => {
            tracing::warn!(user_id = %claims.sub, "token for unknown user");
            unauthorized("Invalid or expired token")
        }
        Err(err) => AppError(err).into_response(),
    }
}
