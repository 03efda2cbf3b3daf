use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by every layer of the platform.
///
/// Repositories translate store-level failures into these kinds; the one
/// place a `Conflict` is recovered locally is idempotent ingredient
/// creation. Everything else propagates to the HTTP layer unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed identifier or request shape.
    #[error("{0}")]
    InvalidInput(String),

    /// Referenced entity is absent.
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation that is not recoverable at the call site.
    #[error("{0}")]
    Conflict(String),

    /// No authenticated principal.
    #[error("{0}")]
    Unauthorized(String),

    /// Principal is known but may not act on the resource.
    #[error("{0}")]
    Forbidden(String),

    /// Semantically invalid payload, including post-normalization schema
    /// failures.
    #[error("{0}")]
    BadRequest(String),

    /// Caller exceeded a request-rate window.
    #[error("{0}")]
    TooManyRequests(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invariant violation or collaborator failure.
    #[error("{0}")]
    Internal(String),
}

impl Error {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Stable machine-readable tag, used by the HTTP error body.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::Unauthorized(_) => "unauthorized",
            Error::Forbidden(_) => "forbidden",
            Error::BadRequest(_) => "bad_request",
            Error::TooManyRequests(_) => "too_many_requests",
            Error::Database(_) => "database",
            Error::Internal(_) => "internal",
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Error::BadRequest(err.to_string())
    }
}
