//! # Firebase ID Token Verifier
//!
//! Checks RS256 signatures against Google's published key set, then the
//! audience, issuer and expiry claims. Keys are cached until the endpoint's
//! `max-age` (or the configured TTL) runs out; an unknown `kid` forces a
//! refetch so rotated keys are picked up, at most once per refetch interval.

use crate::config::FirebaseConfig;
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;
use scholar_core::{AuthError, IdentityVerifier, VerifiedIdentity};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

struct CachedKeys {
    keys: HashMap<String, Arc<DecodingKey>>,
    fetched_at: Instant,
    expires_at: Instant,
}

impl CachedKeys {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

fn unknown_key(kid: &str) -> AuthError {
    AuthError::InvalidToken(format!("unknown signing key: {}", kid))
}

/// Verifies Firebase ID tokens
pub struct FirebaseTokenVerifier {
    config: FirebaseConfig,
    client: Client,
    keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseTokenVerifier {
    pub fn new(config: FirebaseConfig) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            keys: RwLock::new(None),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self, AuthError> {
        Self::new(FirebaseConfig::from_env()?)
    }

    pub fn config(&self) -> &FirebaseConfig {
        &self.config
    }

    /// Answer from the cache when possible. `None` means the key set
    /// should be fetched again.
    fn cached_key(
        &self,
        cache: &Option<CachedKeys>,
        kid: &str,
    ) -> Option<Result<Arc<DecodingKey>, AuthError>> {
        let cached = cache.as_ref().filter(|c| c.is_fresh())?;
        match cached.keys.get(kid) {
            Some(key) => Some(Ok(key.clone())),
            None if cached.fetched_at.elapsed() < self.config.refetch_interval => {
                Some(Err(unknown_key(kid)))
            }
            None => None,
        }
    }

    /// Look up a signing key, refreshing the cache when stale or when the
    /// key id is unknown and the last fetch is older than the refetch interval
    async fn signing_key(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        if let Some(found) = self.cached_key(&*self.keys.read().await, kid) {
            return found;
        }

        let mut cache = self.keys.write().await;

        // Another task may have refreshed while we waited for the lock
        if let Some(found) = self.cached_key(&cache, kid) {
            return found;
        }

        let fresh = self.fetch_keys().await?;
        let key = fresh.keys.get(kid).cloned();
        *cache = Some(fresh);

        key.ok_or_else(|| unknown_key(kid))
    }

    #[instrument(skip(self))]
    async fn fetch_keys(&self) -> Result<CachedKeys, AuthError> {
        let response = self
            .client
            .get(&self.config.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyFetch(format!(
                "key set endpoint returned {}",
                response.status()
            )));
        }

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(max_age)
            .unwrap_or(self.config.cache_ttl);

        let set: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::KeyFetch(format!("malformed key set: {}", e)))?;

        let mut keys = HashMap::new();
        for jwk in set.keys {
            if jwk.kty != "RSA" {
                continue;
            }
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid, Arc::new(key));
                }
                Err(e) => warn!("Skipping unusable signing key {}: {}", jwk.kid, e),
            }
        }

        debug!("Fetched {} signing keys, ttl={:?}", keys.len(), ttl);

        let fetched_at = Instant::now();
        Ok(CachedKeys {
            keys,
            fetched_at,
            expires_at: fetched_at + ttl,
        })
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("missing kid".to_string()))?;
        let key = self.signing_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.config.project_id.as_str()]);
        validation.set_issuer(&[self.config.issuer()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);

        let data = decode::<FirebaseClaims>(token, &key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let claims = data.claims;

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }

        let email = claims
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or(AuthError::MissingEmail)?;

        Ok(VerifiedIdentity {
            uid: claims.sub,
            email,
            name: claims.name,
        })
    }
}

/// Parse `max-age=N` out of a Cache-Control value
fn max_age(value: &str) -> Option<Duration> {
    value
        .split(',')
        .filter_map(|d| d.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}
