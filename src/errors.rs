use actix_web::{http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("permission denied")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("request timed out")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match &e {
            DomainError::Validation(_)
            | DomainError::InvalidStatus
            | DomainError::InvalidOrderStatus => AppError::BadRequest(e.to_string()),
            DomainError::NotFound(_) => AppError::NotFound(e.to_string()),
            DomainError::PermissionDenied => AppError::Forbidden,
            DomainError::Cancelled => AppError::Timeout,
            DomainError::Internal(msg) => AppError::Internal(msg.clone()),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Internal(msg) => {
                log::error!("internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}
