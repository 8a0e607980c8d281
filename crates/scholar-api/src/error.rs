//! # API Errors
//!
//! Every handler and extractor fails with `ApiError`, which renders as
//! `{ "message": ..., "code": ... }`. Forbidden responses also carry the
//! caller's current `role`.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scholar_core::{AccessDenied, AuthError, PaymentError, Role, ServiceError, StoreError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{message}")]
    Forbidden { message: String, role: Option<Role> },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// Logged in full, reported generically
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: u16,
    /// Present (possibly null) only on 403
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Option<Role>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            ApiError::Internal(detail) => {
                error!("Internal error: {}", detail);
                ErrorResponse {
                    message: "Internal server error".to_string(),
                    code: status.as_u16(),
                    role: None,
                }
            }
            ApiError::Forbidden { message, role } => ErrorResponse {
                message,
                code: status.as_u16(),
                role: Some(role),
            },
            other => ErrorResponse {
                message: other.to_string(),
                code: status.as_u16(),
                role: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StoreError::Conflict { .. } | StoreError::InvalidId(_) => {
                ApiError::Validation(err.to_string())
            }
            StoreError::Backend(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::SessionNotFound { .. } => ApiError::NotFound(err.to_string()),
            PaymentError::InvalidRequest(_) => ApiError::Validation(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(e) => e.into(),
            ServiceError::Payment(e) => e.into(),
            ServiceError::Validation(msg) => ApiError::Validation(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Configuration(_) | AuthError::KeyFetch(_) => {
                ApiError::Internal(err.to_string())
            }
            _ => ApiError::Unauthorized("unauthorized access".to_string()),
        }
    }
}

impl From<AccessDenied> for ApiError {
    fn from(denied: AccessDenied) -> Self {
        ApiError::Forbidden {
            message: denied.to_string(),
            role: denied.actual,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// Result type alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let err: ApiError = StoreError::Conflict {
            collection: "review",
            key: "a/b".into(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = StoreError::Backend("pool timed out".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_auth_error_mapping() {
        let err: ApiError = AuthError::InvalidToken("expired".into()).into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err: ApiError = AuthError::KeyFetch("timeout".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_forbidden_body_carries_role() {
        let err: ApiError = AccessDenied {
            required: Role::Admin,
            actual: Some(Role::Student),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let body = match err {
            ApiError::Forbidden { message, role } => ErrorResponse {
                message,
                code: 403,
                role: Some(role),
            },
            other => panic!("unexpected: {:?}", other),
        };
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["message"], "Admin only actions");
        assert_eq!(json["role"], "Student");
    }
}
