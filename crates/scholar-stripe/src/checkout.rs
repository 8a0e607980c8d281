//! # Stripe Checkout Sessions
//!
//! Implementation of the Stripe Checkout Sessions API: create a one-item
//! payment session for an application fee, and retrieve it again when the
//! client comes back from the hosted page.

use crate::config::StripeConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use scholar_core::{
    CheckoutRequest, CheckoutSession, CheckoutStatus, Currency, PaymentError, PaymentGateway,
    PaymentResult,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "stripe";

/// Stripe Checkout Session gateway
///
/// Uses Stripe's hosted checkout page for payments.
pub struct StripeCheckoutGateway {
    config: StripeConfig,
    client: Client,
}

impl StripeCheckoutGateway {
    /// Create a new Stripe checkout gateway
    pub fn new(config: StripeConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = StripeConfig::from_env()?;
        Self::new(config)
    }

    /// Form parameters for a single-item payment session
    fn checkout_form(
        request: &CheckoutRequest,
        success_url: &str,
        cancel_url: &str,
    ) -> Vec<(String, String)> {
        let mut form_params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), success_url.to_string()),
            ("cancel_url".to_string(), cancel_url.to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency.as_str().to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.unit_amount().to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.display_name.clone(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
        ];

        if let Some(ref image) = request.image_url {
            form_params.push((
                "line_items[0][price_data][product_data][images][0]".to_string(),
                image.clone(),
            ));
        }

        if !request.student_email.is_empty() {
            form_params.push(("customer_email".to_string(), request.student_email.clone()));
        }

        let mut metadata: Vec<_> = request.metadata().into_iter().collect();
        metadata.sort();
        for (key, value) in metadata {
            form_params.push((format!("metadata[{}]", key), value));
        }

        form_params
    }

    /// Send a request and decode a session object, mapping Stripe errors
    async fn send_session_request(
        &self,
        builder: RequestBuilder,
        session_id: Option<&str>,
    ) -> PaymentResult<StripeSessionObject> {
        let response = builder
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            if status == StatusCode::NOT_FOUND {
                if let Some(id) = session_id {
                    return Err(PaymentError::SessionNotFound {
                        session_id: id.to_string(),
                    });
                }
            }

            let message = serde_json::from_str::<StripeErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

            return Err(PaymentError::ProviderError {
                provider: PROVIDER.to_string(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeCheckoutGateway {
    #[instrument(skip(self, request), fields(scholarship_id = %request.scholarship_id))]
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
        success_url: &str,
        cancel_url: &str,
    ) -> PaymentResult<CheckoutSession> {
        if request.unit_amount() <= 0 {
            return Err(PaymentError::InvalidRequest(
                "Checkout amount must be positive".to_string(),
            ));
        }

        let form_params = Self::checkout_form(request, success_url, cancel_url);
        debug!(
            "Creating Stripe checkout session: unit_amount={}",
            request.unit_amount()
        );

        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);
        let object = self
            .send_session_request(self.client.post(&url).form(&form_params), None)
            .await?;

        info!("Created Stripe checkout session: id={}", object.id);

        Ok(object.into_session())
    }

    #[instrument(skip(self))]
    async fn retrieve_session(&self, session_id: &str) -> PaymentResult<CheckoutSession> {
        // ids are interpolated into the path
        if session_id.is_empty()
            || !session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(PaymentError::SessionNotFound {
                session_id: session_id.to_string(),
            });
        }

        let url = format!(
            "{}/v1/checkout/sessions/{}",
            self.config.api_base_url, session_id
        );
        let object = self
            .send_session_request(self.client.get(&url), Some(session_id))
            .await?;

        debug!(
            "Retrieved Stripe session: id={}, status={:?}",
            object.id, object.status
        );

        Ok(object.into_session())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeSessionObject {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    payment_intent: Option<String>,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    customer_details: Option<StripeCustomerDetails>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    created: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeCustomerDetails {
    #[serde(default)]
    email: Option<String>,
}

impl StripeSessionObject {
    fn into_session(self) -> CheckoutSession {
        let status = match self.status.as_deref() {
            Some("complete") => CheckoutStatus::Complete,
            Some("expired") => CheckoutStatus::Expired,
            _ => CheckoutStatus::Open,
        };

        let currency = match self.currency.as_deref().map(str::to_lowercase).as_deref() {
            Some("eur") => Currency::EUR,
            Some("gbp") => Currency::GBP,
            Some("jpy") => Currency::JPY,
            _ => Currency::USD,
        };

        let customer_email = self
            .customer_email
            .or_else(|| self.customer_details.and_then(|d| d.email));

        CheckoutSession {
            session_id: self.id,
            provider: PROVIDER.to_string(),
            checkout_url: self.url,
            status,
            payment_status: self.payment_status.unwrap_or_else(|| "unpaid".to_string()),
            payment_intent_id: self.payment_intent,
            customer_email,
            amount_total: self.amount_total,
            currency,
            metadata: self.metadata,
            expires_at: self.expires_at.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            created_at: self
                .created
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_core::checkout::{META_SCHOLARSHIP_ID, META_STUDENT_NAME};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(amount: f64) -> CheckoutRequest {
        CheckoutRequest {
            scholarship_id: "6b1f0000-0000-4000-8000-000000000001".into(),
            display_name: "Rhodes Scholarship".into(),
            image_url: Some("https://img.example/rhodes.png".into()),
            amount,
            currency: Currency::USD,
            student_name: "Ada".into(),
            student_email: "ada@x.io".into(),
        }
    }

    async fn gateway(server: &MockServer) -> StripeCheckoutGateway {
        let config = StripeConfig::new("sk_test_abc123").with_api_base_url(server.uri());
        StripeCheckoutGateway::new(config).unwrap()
    }

    #[test]
    fn test_checkout_form() {
        let form = StripeCheckoutGateway::checkout_form(
            &request(25.0),
            "https://app/payment-success?session_id={CHECKOUT_SESSION_ID}",
            "https://app/dashboard",
        );
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("2500"));
        assert_eq!(get("line_items[0][price_data][currency]"), Some("usd"));
        assert_eq!(get("customer_email"), Some("ada@x.io"));
        assert_eq!(
            get("metadata[scholarshipId]"),
            Some("6b1f0000-0000-4000-8000-000000000001")
        );
        assert_eq!(get("metadata[studentName]"), Some("Ada"));
    }

    #[tokio::test]
    async fn test_create_checkout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("Authorization", "Bearer sk_test_abc123"))
            .and(body_string_contains("unit_amount%5D=2500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_123",
                "url": "https://checkout.stripe.com/c/pay/cs_test_123",
                "status": "open",
                "payment_status": "unpaid",
                "expires_at": 1_900_000_000
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = gateway(&server)
            .await
            .create_checkout(&request(25.0), "https://app/ok", "https://app/cancel")
            .await
            .unwrap();

        assert_eq!(session.session_id, "cs_test_123");
        assert_eq!(
            session.checkout_url.as_deref(),
            Some("https://checkout.stripe.com/c/pay/cs_test_123")
        );
        assert!(session.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_create_checkout_provider_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Invalid integer: abc", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .await
            .create_checkout(&request(25.0), "https://app/ok", "https://app/cancel")
            .await
            .unwrap_err();

        match err {
            PaymentError::ProviderError { message, .. } => {
                assert_eq!(message, "Invalid integer: abc")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retrieve_completed_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/checkout/sessions/cs_test_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_123",
                "url": null,
                "status": "complete",
                "payment_status": "paid",
                "payment_intent": "pi_123",
                "customer_email": null,
                "customer_details": { "email": "ada@x.io" },
                "amount_total": 2500,
                "currency": "usd",
                "metadata": {
                    "scholarshipId": "6b1f0000-0000-4000-8000-000000000001",
                    "studentName": "Ada"
                },
                "created": 1_700_000_000
            })))
            .mount(&server)
            .await;

        let session = gateway(&server)
            .await
            .retrieve_session("cs_test_123")
            .await
            .unwrap();

        assert!(session.is_complete());
        assert_eq!(session.transaction_id(), "pi_123");
        assert_eq!(session.customer_email.as_deref(), Some("ada@x.io"));
        assert_eq!(session.amount_major(), 25.0);
        assert_eq!(
            session.metadata_value(META_SCHOLARSHIP_ID),
            Some("6b1f0000-0000-4000-8000-000000000001")
        );
        assert_eq!(session.metadata_value(META_STUDENT_NAME), Some("Ada"));
    }

    #[tokio::test]
    async fn test_retrieve_unknown_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/checkout/sessions/cs_missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "message": "No such checkout.session: 'cs_missing'", "code": "resource_missing" }
            })))
            .mount(&server)
            .await;

        let gateway = gateway(&server).await;
        let err = gateway.retrieve_session("cs_missing").await.unwrap_err();
        assert!(matches!(err, PaymentError::SessionNotFound { .. }));

        let err = gateway.retrieve_session("../v1/customers").await.unwrap_err();
        assert!(matches!(err, PaymentError::SessionNotFound { .. }));
    }
}
