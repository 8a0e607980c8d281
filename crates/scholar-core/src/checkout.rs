//! # Checkout Types
//!
//! Hosted checkout session types shared by the orchestrator and the
//! payment gateway adapters.

use crate::money::Currency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Session metadata key carrying the scholarship being paid for
pub const META_SCHOLARSHIP_ID: &str = "scholarshipId";
/// Session metadata key carrying the student's display name
pub const META_STUDENT_NAME: &str = "studentName";
/// Session metadata key carrying the student's email
pub const META_STUDENT_EMAIL: &str = "studentEmail";

/// A single-item checkout for one scholarship's application fee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Scholarship reference (echoed back through session metadata)
    pub scholarship_id: String,

    /// Product name shown on the hosted page
    pub display_name: String,

    /// Optional product image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Fee in major currency units
    pub amount: f64,

    /// Currency of `amount`
    #[serde(default)]
    pub currency: Currency,

    pub student_name: String,

    /// Customer email (prefilled on the hosted page)
    pub student_email: String,
}

impl CheckoutRequest {
    /// Fee in the provider's smallest unit
    pub fn unit_amount(&self) -> i64 {
        self.currency.to_smallest_unit(self.amount)
    }

    /// Metadata attached to the session so reconciliation can find its way back
    pub fn metadata(&self) -> HashMap<String, String> {
        HashMap::from([
            (META_SCHOLARSHIP_ID.to_string(), self.scholarship_id.clone()),
            (META_STUDENT_NAME.to_string(), self.student_name.clone()),
            (META_STUDENT_EMAIL.to_string(), self.student_email.clone()),
        ])
    }

    /// Reject amounts no provider would accept
    pub fn validate(&self) -> Result<(), String> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err("applicationFees must be a positive amount".to_string());
        }
        if self.scholarship_id.trim().is_empty() {
            return Err("scholarshipId is required".to_string());
        }
        Ok(())
    }
}

/// Status of a checkout session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    /// Session created, awaiting payment
    #[default]
    Open,
    /// Checkout flow finished
    Complete,
    /// Session expired
    Expired,
}

/// A checkout session as reported by the payment provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session ID
    pub session_id: String,

    /// Provider name (e.g., "stripe")
    pub provider: String,

    /// URL to redirect the customer to (only while open)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,

    /// Session status
    #[serde(default)]
    pub status: CheckoutStatus,

    /// Provider payment status (`paid`, `unpaid`, `no_payment_required`)
    #[serde(default)]
    pub payment_status: String,

    /// Payment intent ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,

    /// Email the customer paid with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    /// Amount charged in the smallest currency unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_total: Option<i64>,

    #[serde(default)]
    pub currency: Currency,

    /// Metadata echoed back from session creation
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// When the session expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl CheckoutSession {
    /// Create a new open session
    pub fn new(session_id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            provider: provider.into(),
            checkout_url: None,
            status: CheckoutStatus::Open,
            payment_status: "unpaid".to_string(),
            payment_intent_id: None,
            customer_email: None,
            amount_total: None,
            currency: Currency::USD,
            metadata: HashMap::new(),
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.status, CheckoutStatus::Complete)
    }

    /// Identifier an application is keyed on: the payment intent, or the
    /// session itself when the provider reports none
    pub fn transaction_id(&self) -> &str {
        self.payment_intent_id
            .as_deref()
            .unwrap_or(&self.session_id)
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Amount charged in major units
    pub fn amount_major(&self) -> f64 {
        self.amount_total
            .map(|a| self.currency.from_smallest_unit(a))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount: f64) -> CheckoutRequest {
        CheckoutRequest {
            scholarship_id: "sch_1".into(),
            display_name: "Rhodes".into(),
            image_url: None,
            amount,
            currency: Currency::USD,
            student_name: "Ada".into(),
            student_email: "ada@x.io".into(),
        }
    }

    #[test]
    fn test_unit_amount_in_cents() {
        assert_eq!(request(49.99).unit_amount(), 4999);
    }

    #[test]
    fn test_validation() {
        assert!(request(10.0).validate().is_ok());
        assert!(request(0.0).validate().is_err());
        assert!(request(-5.0).validate().is_err());
        assert!(request(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_metadata_keys() {
        let meta = request(10.0).metadata();
        assert_eq!(meta.get(META_SCHOLARSHIP_ID).map(String::as_str), Some("sch_1"));
        assert_eq!(meta.get(META_STUDENT_EMAIL).map(String::as_str), Some("ada@x.io"));
    }

    #[test]
    fn test_transaction_id_falls_back_to_session() {
        let mut session = CheckoutSession::new("cs_test_1", "stripe");
        assert_eq!(session.transaction_id(), "cs_test_1");
        session.payment_intent_id = Some("pi_1".into());
        assert_eq!(session.transaction_id(), "pi_1");
    }

    #[test]
    fn test_new_checkout_session_is_open() {
        let session = CheckoutSession::new("cs_123", "stripe");
        assert_eq!(session.status, CheckoutStatus::Open);
        assert!(!session.is_complete());
        assert_eq!(session.amount_major(), 0.0);
    }
}
