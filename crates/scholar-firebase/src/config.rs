//! # Firebase Configuration
//!
//! The service account arrives as base64-encoded JSON in `SS_SERVICE_KEY`.
//! Only the project id is needed to verify ID tokens.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use scholar_core::AuthError;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Google's published signing keys for Firebase ID tokens
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const DEFAULT_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

/// Fields of a service-account key file we care about
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    #[serde(default)]
    pub client_email: Option<String>,
}

impl ServiceAccount {
    /// Decode a base64 service-account JSON blob
    pub fn from_base64(encoded: &str) -> Result<Self, AuthError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AuthError::Configuration(format!("service key is not base64: {}", e)))?;

        let account: ServiceAccount = serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::Configuration(format!("service key is not JSON: {}", e)))?;

        if account.project_id.trim().is_empty() {
            return Err(AuthError::Configuration(
                "service key has empty project_id".to_string(),
            ));
        }

        Ok(account)
    }
}

/// Token verification settings
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// Expected `aud` claim
    pub project_id: String,

    /// Key set endpoint (overridable for tests)
    pub jwks_url: String,

    /// How long fetched keys are trusted when the response has no max-age
    pub cache_ttl: Duration,

    /// Minimum gap between key set fetches triggered by an unknown `kid`
    pub refetch_interval: Duration,
}

impl FirebaseConfig {
    /// Load from `SS_SERVICE_KEY`
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();

        let encoded = env::var("SS_SERVICE_KEY")
            .map_err(|_| AuthError::Configuration("SS_SERVICE_KEY not set".to_string()))?;

        let account = ServiceAccount::from_base64(&encoded)?;
        Ok(Self::new(account.project_id))
    }

    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            jwks_url: DEFAULT_JWKS_URL.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            refetch_interval: DEFAULT_REFETCH_INTERVAL,
        }
    }

    /// Expected `iss` claim
    pub fn issuer(&self) -> String {
        format!("{}{}", ISSUER_PREFIX, self.project_id)
    }

    /// Builder: set custom key set URL (for testing)
    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_refetch_interval(mut self, interval: Duration) -> Self {
        self.refetch_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_account_decoding() {
        let json = r#"{"type":"service_account","project_id":"scholar-stream","client_email":"svc@scholar-stream.iam.gserviceaccount.com"}"#;
        let account = ServiceAccount::from_base64(&STANDARD.encode(json)).unwrap();
        assert_eq!(account.project_id, "scholar-stream");
        assert!(account.client_email.is_some());
    }

    #[test]
    fn test_service_account_rejects_garbage() {
        assert!(ServiceAccount::from_base64("not base64 !!").is_err());
        assert!(ServiceAccount::from_base64(&STANDARD.encode("{}")).is_err());
        assert!(ServiceAccount::from_base64(&STANDARD.encode(r#"{"project_id":" "}"#)).is_err());
    }

    #[test]
    fn test_issuer() {
        let config = FirebaseConfig::new("scholar-stream");
        assert_eq!(config.issuer(), "https://securetoken.google.com/scholar-stream");
        assert_eq!(config.jwks_url, DEFAULT_JWKS_URL);
        assert_eq!(config.refetch_interval, Duration::from_secs(60));
    }
}
