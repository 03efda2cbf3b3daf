use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tastebook_shared::Error;

/// HTTP-facing wrapper around the shared error taxonomy. Every handler
/// returns `Result<_, AppError>`; the body is the API's error envelope.
pub struct AppError(pub Error);

impl<E: Into<Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidInput(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        Error::Forbidden(_) => StatusCode::FORBIDDEN,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
        Error::Database(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);

        // 5xx details stay in the logs, not the response body.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        let body = json!({
            "success": false,
            "error": { "kind": self.0.kind(), "message": message },
        });
        (status, Json(body)).into_response()
    }
}
