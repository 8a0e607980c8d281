//! # Error Types
//!
//! Typed errors for the scholarstream domain.
//! Storage adapters return `StoreError`, payment adapters `PaymentError`,
//! identity adapters `AuthError`. `ServiceError` is what the orchestrator
//! surfaces to the HTTP layer.

use thiserror::Error;

/// Errors raised by repository implementations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed document does not exist
    #[error("{collection} not found: {id}")]
    NotFound { collection: &'static str, id: String },

    /// A uniqueness constraint rejected the write
    #[error("Duplicate {collection}: {key}")]
    Conflict { collection: &'static str, key: String },

    /// Identifier could not be parsed
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// Backend failure (connection, query, decoding)
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true if this error is a uniqueness violation
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::NotFound { .. } => 404,
            StoreError::Conflict { .. } => 400,
            StoreError::InvalidId(_) => 400,
            StoreError::Backend(_) => 500,
        }
    }
}

/// Errors raised by payment provider adapters
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Session unknown to the provider or owned by another account
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaymentError {
    /// Returns the HTTP status code appropriate for this error.
    ///
    /// Provider and transport failures are deliberately collapsed to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::SessionNotFound { .. } => 404,
            PaymentError::Configuration(_)
            | PaymentError::ProviderError { .. }
            | PaymentError::NetworkError(_)
            | PaymentError::Serialization(_) => 500,
        }
    }
}

/// Errors raised while verifying a caller's identity token
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token on the request
    #[error("Missing bearer token")]
    MissingToken,

    /// Token is malformed, expired, or fails signature checks
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token verified but carries no email claim
    #[error("Token has no email claim")]
    MissingEmail,

    /// Verifier misconfigured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Could not reach the identity service
    #[error("Key fetch failed: {0}")]
    KeyFetch(String),
}

/// Errors surfaced by the checkout orchestrator
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Caller input rejected before reaching a collaborator
    #[error("Invalid request: {0}")]
    Validation(String),
}

impl ServiceError {
    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Store(e) => e.status_code(),
            ServiceError::Payment(e) => e.status_code(),
            ServiceError::Validation(_) => 400,
        }
    }
}

/// Result type alias for repository operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_status_codes() {
        assert_eq!(
            StoreError::NotFound {
                collection: "scholarship",
                id: "x".into()
            }
            .status_code(),
            404
        );
        assert_eq!(StoreError::InvalidId("nope".into()).status_code(), 400);
        assert_eq!(StoreError::Backend("down".into()).status_code(), 500);
        assert!(StoreError::Conflict {
            collection: "review",
            key: "k".into()
        }
        .is_conflict());
    }

    #[test]
    fn test_provider_errors_are_generic_server_errors() {
        let err = PaymentError::ProviderError {
            provider: "stripe".into(),
            message: "Invalid integer: -100".into(),
        };
        assert_eq!(err.status_code(), 500);
        assert_eq!(
            PaymentError::SessionNotFound {
                session_id: "cs_x".into()
            }
            .status_code(),
            404
        );
    }

    #[test]
    fn test_service_error_delegates() {
        let err: ServiceError = StoreError::InvalidId("abc".into()).into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(ServiceError::Validation("fee".into()).status_code(), 400);
    }
}
