//! # scholar-stripe
//!
//! Stripe payment gateway for scholarstream.
//!
//! `StripeCheckoutGateway` implements `PaymentGateway` on top of the Stripe
//! Checkout Sessions API:
//! - one `payment`-mode line item per application fee
//! - customer email prefill
//! - scholarship and student carried as session metadata
//! - session retrieval for post-payment reconciliation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scholar_stripe::StripeCheckoutGateway;
//! use scholar_core::PaymentGateway;
//!
//! // Create gateway from environment (STRIPE_SECRET_KEY)
//! let gateway = StripeCheckoutGateway::from_env()?;
//!
//! let session = gateway.create_checkout(
//!     &request,
//!     "https://example.com/payment-success?session_id={CHECKOUT_SESSION_ID}",
//!     "https://example.com/dashboard",
//! ).await?;
//!
//! // Redirect user to session.checkout_url, later:
//! let paid = gateway.retrieve_session(&session.session_id).await?;
//! ```

pub mod checkout;
pub mod config;

// Re-exports
pub use checkout::StripeCheckoutGateway;
pub use config::StripeConfig;
