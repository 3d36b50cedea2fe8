use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Postgres SQLSTATE codes that mean a concurrent writer won the upsert race
const UNIQUE_VIOLATION: &str = "23505";
const SERIALIZATION_FAILURE: &str = "40001";

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid context: {0}")]
    InvalidContext(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("No recommendations available for this context")]
    NoRecommendationsAvailable,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),

    #[error("Recommendation write conflict for {0}")]
    CacheWriteConflict(String),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Classifies a failed recommendation write.
    ///
    /// Lost upsert races surface as `CacheWriteConflict` so the caller can retry;
    /// everything else stays a storage failure.
    pub fn from_upsert(err: sqlx::Error, context: impl Into<String>) -> Self {
        let conflict = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == UNIQUE_VIOLATION || code == SERIALIZATION_FAILURE);

        if conflict {
            AppError::CacheWriteConflict(context.into())
        } else {
            AppError::StorageUnavailable(err)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidContext(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::UserNotFound(_) | AppError::NoRecommendationsAvailable => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::CacheWriteConflict(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::StorageUnavailable(_) | AppError::Cache(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::ExternalApi(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
