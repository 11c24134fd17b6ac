use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Rate limited by upstream provider")]
    RateLimited,
    #[error("External error: {0}")]
    External(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::RateLimited => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("5"));
                (StatusCode::TOO_MANY_REQUESTS, headers, "Rate limited").into_response()
            }
            AppError::External(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
            AppError::Db(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        AppError::Db(value)
    }
}
