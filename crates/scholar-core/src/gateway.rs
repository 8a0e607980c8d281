//! # Payment Gateway Trait
//!
//! Seam between the checkout orchestrator and a hosted-checkout provider.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │          PaymentGateway (trait)          │
//! │  ├── create_checkout()                   │
//! │  ├── retrieve_session()                  │
//! │  └── provider_name()                     │
//! └──────────────────────────────────────────┘
//!                     ▲
//!          ┌──────────┴──────────┐
//!  ┌───────┴───────┐     ┌───────┴───────┐
//!  │StripeCheckout │     │  test fakes   │
//!  │   Gateway     │     │               │
//!  └───────────────┘     └───────────────┘
//! ```

use crate::checkout::{CheckoutRequest, CheckoutSession};
use crate::error::PaymentResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Hosted checkout provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a checkout session and return it with its redirect URL.
    ///
    /// # Arguments
    /// * `request` - What is being paid for and by whom
    /// * `success_url` - URL to redirect after successful payment
    /// * `cancel_url` - URL to redirect if customer cancels
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
        success_url: &str,
        cancel_url: &str,
    ) -> PaymentResult<CheckoutSession>;

    /// Fetch the current state of a previously created session.
    ///
    /// Fails with `PaymentError::SessionNotFound` when the provider does not
    /// know the session for this account.
    async fn retrieve_session(&self, session_id: &str) -> PaymentResult<CheckoutSession>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Shared handle to a payment gateway (dynamic dispatch)
pub type SharedPaymentGateway = Arc<dyn PaymentGateway>;

/// Redirect targets handed to the provider
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    /// Client application origin (e.g., "https://scholarstream.app")
    pub base_url: String,
    /// Page that confirms the payment (e.g., "/payment-success")
    pub success_path: String,
    /// Page to return to on cancel (e.g., "/dashboard")
    pub cancel_path: String,
}

impl CheckoutUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base: String = base_url.into();
        Self {
            base_url: base.trim_end_matches('/').to_string(),
            success_path: "/payment-success".to_string(),
            cancel_path: "/dashboard".to_string(),
        }
    }

    /// Success URL with the provider's session id placeholder
    pub fn success_url(&self) -> String {
        format!(
            "{}{}?session_id={{CHECKOUT_SESSION_ID}}",
            self.base_url, self.success_path
        )
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.base_url, self.cancel_path)
    }
}

impl Default for CheckoutUrls {
    fn default() -> Self {
        Self::new("http://localhost:5173")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_urls() {
        let urls = CheckoutUrls::new("https://scholarstream.app/");

        assert_eq!(
            urls.success_url(),
            "https://scholarstream.app/payment-success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(urls.cancel_url(), "https://scholarstream.app/dashboard");
    }
}
