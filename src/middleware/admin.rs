use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tastebook_shared::user::Role;
use tastebook_shared::Error;
use tracing::warn;

use crate::error::AppError;
use crate::middleware::Auth;

/// Gate for the `/admin` subtree; runs after `auth_middleware`.
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, Response> {
    let auth = request.extensions().get::<Auth>().cloned().ok_or_else(|| {
        warn!("admin route reached without authenticated user");
        AppError(Error::Unauthorized("Authentication required".to_string())).into_response()
    })?;

    if auth.role != Role::Admin {
        warn!(user_id = %auth.user_id, "non-admin attempted an admin route");
        return Err(AppError(Error::Forbidden(
            "Admin privileges required".to_string(),
        ))
        .into_response());
    }

    Ok(next.run(request).await)
}
