use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    /// Another user already holds this email.
    #[error("User with email '{0}' already exists")]
    EmailUniqueness(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<DbErr> for UserError {
    fn from(err: DbErr) -> Self {
        UserError::Store(err.to_string())
    }
}

impl From<redis::RedisError> for UserError {
    fn from(err: redis::RedisError) -> Self {
        UserError::Cache(err.to_string())
    }
}

impl UserError {
    /// Map a failed insert, turning a unique violation on `email` into
    /// [`UserError::EmailUniqueness`].
    pub fn from_insert(err: DbErr, email: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                UserError::EmailUniqueness(email.to_string())
            }
            _ => err.into(),
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::EmailUniqueness(email) => {
                AppError::Conflict(format!("User with email '{}' already exists", email))
            }
            UserError::Store(msg) => AppError::Store(msg),
            UserError::Cache(msg) => AppError::Cache(msg),
            UserError::Serialization(e) => AppError::SerdeJson(e),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
