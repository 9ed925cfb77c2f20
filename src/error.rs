use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// The single error type returned by API handlers and extractors. Every variant
/// renders as `{"error": "<message>"}` with the matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Details are logged, the client only sees a generic message.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            tracing::error!("internal error: {}", detail);
        }
        let body = Json(json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

/// RepoError
///
/// Failures surfaced by the persistence layer.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A unique constraint rejected the write (duplicate name or email).
    #[error("record already exists")]
    Duplicate,

    /// A write referenced a user that does not exist (foreign key violation).
    #[error("referenced user does not exist")]
    UnknownOwner,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl RepoError {
    /// Maps a raw driver error, recognising Postgres unique violations.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Duplicate,
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => Self::UnknownOwner,
            _ => Self::Database(err),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate => ApiError::Conflict("User already exists".to_string()),
            // The session outlived its account.
            RepoError::UnknownOwner => {
                ApiError::Unauthorized("Unauthorized: Unknown user".to_string())
            }
            RepoError::Database(e) => ApiError::Internal(format!("database error: {e}")),
        }
    }
}
