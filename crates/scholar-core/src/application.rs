//! # Application Types
//!
//! A student application is created once per completed checkout and
//! carries a snapshot of the scholarship it was paid for.

use crate::id::DocumentId;
use crate::scholarship::Scholarship;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review state assigned by moderators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Processing => "processing",
            ApplicationStatus::Completed => "completed",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(ApplicationStatus::Pending),
            "processing" => Some(ApplicationStatus::Processing),
            "completed" => Some(ApplicationStatus::Completed),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub scholarship_id: DocumentId,
    /// Provider payment identifier, unique across applications
    pub transaction_id: String,
    pub student_name: String,
    pub student_email: String,
    pub status: ApplicationStatus,
    pub payment_status: String,
    /// Amount actually charged, in major units
    pub amount: f64,

    // Snapshot of the scholarship at payment time
    pub scholarship_name: String,
    pub university_name: String,
    pub application_fees: f64,
    pub country: String,
    pub city: String,
    pub degree: String,
    pub subject_category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub applied_at: DateTime<Utc>,
}

/// Payment facts needed to open an application
#[derive(Debug, Clone)]
pub struct PaidCheckout {
    pub transaction_id: String,
    pub student_name: String,
    pub student_email: String,
    pub payment_status: String,
    pub amount: f64,
}

impl Application {
    /// Build a pending application from a paid checkout and the scholarship it paid for
    pub fn from_payment(scholarship: &Scholarship, payment: PaidCheckout) -> Self {
        let details = &scholarship.details;
        Self {
            id: DocumentId::new(),
            scholarship_id: scholarship.id,
            transaction_id: payment.transaction_id,
            student_name: payment.student_name,
            student_email: payment.student_email,
            status: ApplicationStatus::Pending,
            payment_status: payment.payment_status,
            amount: payment.amount,
            scholarship_name: details.scholarship_name.clone(),
            university_name: details.university_name.clone(),
            application_fees: details.application_fees,
            country: details.country.clone(),
            city: details.city.clone(),
            degree: details.degree.clone(),
            subject_category: details.subject_category.clone(),
            feedback: None,
            applied_at: Utc::now(),
        }
    }
}

/// Moderator update of an application
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Row of the applications-per-university report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversityCount {
    pub university_name: String,
    pub applications: u64,
}
