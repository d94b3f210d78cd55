use crate::handlers::db::StoreError;
use crate::handlers::password::PasswordError;
use crate::handlers::token::TokenError;
use crate::middleware::auth_middleware::AuthError;
use actix_web::error::ResponseError;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid arguments: {0:?}")]
    InvalidArgument(Vec<FieldViolation>),
    /// Every authentication failure ends up here. The body is the same for
    /// all of them.
    #[error("unauthenticated")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("canceled: {0}")]
    Canceled(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Store failure on a book mutation: constraint violations are the
    /// caller's fault, everything else is ours.
    pub fn from_book_store(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation(_) | StoreError::ForeignKeyViolation(_) => {
                AppError::Forbidden(e.to_string())
            }
            other => other.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation(_) | StoreError::ForeignKeyViolation(_) => {
                AppError::Conflict(e.to_string())
            }
            StoreError::NotFound => AppError::NotFound("resource not found".to_string()),
            StoreError::Canceled(_) => AppError::Canceled(e.to_string()),
            StoreError::Other(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(_: AuthError) -> Self {
        AppError::Unauthorized
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        AppError::Internal(format!("cannot create access token: {e}"))
    }
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Canceled(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::InvalidArgument(violations) => json!({
                "error": "invalid arguments",
                "violations": violations,
            }),
            AppError::Unauthorized => json!({ "error": "unauthenticated" }),
            AppError::Internal(detail) => {
                log::error!("[BOOKSTORE-INTERNAL] {}", detail);
                json!({ "error": "internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
