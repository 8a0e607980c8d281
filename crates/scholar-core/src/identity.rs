//! # Identity Verification
//!
//! Callers authenticate with a bearer token issued by an external identity
//! service. Implementations turn that token into a verified email or fail.

use crate::error::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Who the identity service says the caller is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// Identity-service user id (`sub`)
    pub uid: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token` and return the identity it asserts
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError>;
}

/// Shared handle to a verifier (dynamic dispatch)
pub type SharedIdentityVerifier = Arc<dyn IdentityVerifier>;

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::MissingToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def").unwrap(), "abc.def");
        assert_eq!(bearer_token("bearer   abc").unwrap(), "abc");
        assert!(bearer_token("Bearer").is_err());
        assert!(bearer_token("Basic abc").is_err());
        assert!(bearer_token("").is_err());
    }
}
