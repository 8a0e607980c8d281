//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the store, identity verifier, checkout orchestrator and configuration.

use anyhow::Context;
use scholar_core::{
    CheckoutOrchestrator, CheckoutUrls, MemoryStore, SharedIdentityVerifier,
    SharedPaymentGateway, SharedStore,
};
use scholar_firebase::FirebaseTokenVerifier;
use scholar_postgres::PgStore;
use scholar_stripe::StripeCheckoutGateway;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Client origin: allowed by CORS and used for checkout redirects
    pub client_domain: String,
    /// Postgres URL; `None` runs on the in-memory store
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Emit JSON log lines
    pub json_logs: bool,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            client_domain: std::env::var("CLIENT_DOMAIN").unwrap_or(defaults.client_domain),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.database_max_connections),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            client_domain: "http://localhost:5173".to_string(),
            database_url: None,
            database_max_connections: 10,
            environment: "development".to_string(),
            json_logs: false,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub verifier: SharedIdentityVerifier,
    pub checkout: CheckoutOrchestrator,
    pub config: AppConfig,
}

impl AppState {
    /// Build production state: Postgres (or memory), Firebase, Stripe
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store: SharedStore = match config.database_url.as_deref() {
            Some(url) => {
                let store = PgStore::connect(url, config.database_max_connections)
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                store.migrate().await.context("Failed to run migrations")?;
                Arc::new(store) as SharedStore
            }
            None => {
                warn!("DATABASE_URL not set, using in-memory store (data is not persisted)");
                Arc::new(MemoryStore::new()) as SharedStore
            }
        };

        let verifier = FirebaseTokenVerifier::from_env()
            .context("Failed to initialize Firebase token verification")?;
        info!("Verifying ID tokens for project {}", verifier.config().project_id);

        let gateway = StripeCheckoutGateway::from_env().context("Failed to initialize Stripe")?;

        Ok(Self::with_parts(
            config,
            store,
            Arc::new(verifier),
            Arc::new(gateway),
        ))
    }

    /// Assemble state from already-built collaborators
    pub fn with_parts(
        config: AppConfig,
        store: SharedStore,
        verifier: SharedIdentityVerifier,
        gateway: SharedPaymentGateway,
    ) -> Self {
        let urls = CheckoutUrls::new(&config.client_domain);
        let checkout = CheckoutOrchestrator::new(store.clone(), gateway, urls);

        Self {
            store,
            verifier,
            checkout,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.client_domain, "http://localhost:5173");
        assert!(config.database_url.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ..AppConfig::default()
        };

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");

        let config = AppConfig {
            host: "not a host".to_string(),
            ..AppConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }
}
