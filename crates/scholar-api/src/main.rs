//! # ScholarStream
//!
//! Scholarship management backend.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export SS_SERVICE_KEY=$(base64 -w0 service-account.json)
//! export DATABASE_URL=postgres://localhost/scholarstream
//!
//! # Run the server
//! scholarstream
//! ```

use scholar_api::{routes, state::AppConfig, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    // Initialize logging
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    if config.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    // Print banner
    print_banner();

    // Initialize application state
    let state = AppState::new(config).await?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Client domain: {}", state.config.client_domain);
    info!("Payment provider: {}", state.checkout.provider_name());

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("ScholarStream listening on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Search: GET http://{}/allscholarships?search=&page=1", addr);
        info!("Checkout: POST http://{}/create-checkout-session", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  ScholarStream
  ━━━━━━━━━━━━━━━━━━━━━━━
  Scholarship management API
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
