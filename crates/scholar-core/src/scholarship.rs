//! # Scholarship Types
//!
//! Scholarships are posted by administrators and browsed by anyone.
//! The paged listing accepts a name search, a country filter, a fee sort
//! and page/limit, which storage adapters translate into native
//! filter/sort/offset/limit clauses.

use crate::id::DocumentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields supplied by an administrator when posting or replacing a scholarship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScholarshipDetails {
    pub scholarship_name: String,
    pub university_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university_image: Option<String>,
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_rank: Option<i32>,
    /// Degree level (Diploma, Bachelor, Masters, ...)
    pub degree: String,
    pub subject_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scholarship_category: Option<String>,
    /// Application fee in major currency units
    pub application_fees: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_charge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderator_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderator_email: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ScholarshipDetails {
    /// Reject payloads the listing and checkout flows cannot work with
    pub fn validate(&self) -> Result<(), String> {
        if self.scholarship_name.trim().is_empty() {
            return Err("scholarshipName is required".to_string());
        }
        if self.university_name.trim().is_empty() {
            return Err("universityName is required".to_string());
        }
        if self.country.trim().is_empty() {
            return Err("country is required".to_string());
        }
        if !self.application_fees.is_finite() || self.application_fees < 0.0 {
            return Err("applicationFees must be a non-negative number".to_string());
        }
        Ok(())
    }
}

/// A stored scholarship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scholarship {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub details: ScholarshipDetails,
    pub posted_at: DateTime<Utc>,
    pub posted_by: String,
}

impl Scholarship {
    /// Create a new scholarship posted by `posted_by`
    pub fn new(details: ScholarshipDetails, posted_by: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            details,
            posted_at: Utc::now(),
            posted_by: posted_by.into(),
        }
    }
}

/// Ordering of the paged listing by application fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeeSort {
    #[default]
    #[serde(rename = "fees_asc")]
    Ascending,
    #[serde(rename = "fees_desc")]
    Descending,
    /// Any other value leaves posting order untouched
    #[serde(other)]
    Unsorted,
}

/// Query parameters of the public scholarship listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScholarshipQuery {
    /// Case-insensitive substring of the scholarship name
    #[serde(default)]
    pub search: String,
    /// Exact country match
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub sort_by: FeeSort,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    8
}

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: u64 = 100;

impl Default for ScholarshipQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            country: String::new(),
            sort_by: FeeSort::default(),
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl ScholarshipQuery {
    pub fn validate(&self) -> Result<(), String> {
        if self.page == 0 {
            return Err("page must be at least 1".to_string());
        }
        if self.limit == 0 || self.limit > MAX_PAGE_SIZE {
            return Err(format!("limit must be between 1 and {}", MAX_PAGE_SIZE));
        }
        let offset = (self.page - 1).checked_mul(self.limit);
        if offset.map_or(true, |o| o > i64::MAX as u64) {
            return Err("page is out of range".to_string());
        }
        Ok(())
    }

    /// Number of matching documents to skip
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Trimmed search term, if any
    pub fn search_term(&self) -> Option<&str> {
        Some(self.search.trim()).filter(|s| !s.is_empty())
    }

    /// Trimmed country filter, if any
    pub fn country_filter(&self) -> Option<&str> {
        Some(self.country.trim()).filter(|s| !s.is_empty())
    }

    /// In-process equivalent of the storage filter
    pub fn matches(&self, scholarship: &Scholarship) -> bool {
        let name_ok = self.search_term().map_or(true, |term| {
            scholarship
                .details
                .scholarship_name
                .to_lowercase()
                .contains(&term.to_lowercase())
        });
        let country_ok = self
            .country_filter()
            .map_or(true, |c| scholarship.details.country == c);
        name_ok && country_ok
    }
}

/// One page of the public scholarship listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScholarshipPage {
    pub scholarships: Vec<Scholarship>,
    /// Size of the full filtered set
    pub total: u64,
    pub pages: u64,
    pub current_page: u64,
}

impl ScholarshipPage {
    pub fn new(scholarships: Vec<Scholarship>, total: u64, query: &ScholarshipQuery) -> Self {
        Self {
            scholarships,
            total,
            pages: total.div_ceil(query.limit.max(1)),
            current_page: query.page,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn details(name: &str, country: &str, fee: f64) -> ScholarshipDetails {
        ScholarshipDetails {
            scholarship_name: name.to_string(),
            university_name: format!("{} University", name),
            university_image: None,
            country: country.to_string(),
            city: "Cambridge".to_string(),
            world_rank: Some(1),
            degree: "Masters".to_string(),
            subject_category: "Engineering".to_string(),
            scholarship_category: Some("Full fund".to_string()),
            application_fees: fee,
            service_charge: None,
            deadline: None,
            moderator_name: None,
            moderator_email: None,
            images: vec![],
        }
    }

    #[test]
    fn test_query_defaults_from_json() {
        let query: ScholarshipQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 8);
        assert_eq!(query.sort_by, FeeSort::Ascending);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_sort_parsing() {
        let query: ScholarshipQuery =
            serde_json::from_str(r#"{"sortBy":"fees_desc","page":2}"#).unwrap();
        assert_eq!(query.sort_by, FeeSort::Descending);
        assert_eq!(query.offset(), 8);

        let query: ScholarshipQuery = serde_json::from_str(r#"{"sortBy":"newest"}"#).unwrap();
        assert_eq!(query.sort_by, FeeSort::Unsorted);
    }

    #[test]
    fn test_query_validation() {
        let mut query = ScholarshipQuery::default();
        assert!(query.validate().is_ok());
        query.page = 0;
        assert!(query.validate().is_err());
        query.page = 1;
        query.limit = 0;
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_query_validation_rejects_unrepresentable_offset() {
        let mut query = ScholarshipQuery {
            page: 1_152_921_504_606_846_977,
            limit: 8,
            ..Default::default()
        };
        assert!(query.validate().is_err());

        query.page = u64::MAX;
        query.limit = 1;
        assert!(query.validate().is_err());

        // Largest offset that still fits a signed 64-bit bind
        query.page = i64::MAX as u64 + 1;
        assert!(query.validate().is_ok());
        assert_eq!(query.offset(), i64::MAX as u64);
    }

    #[test]
    fn test_matches_is_case_insensitive_substring() {
        let s = Scholarship::new(details("MIT Presidential Fellowship", "USA", 50.0), "a@x.io");
        let query = ScholarshipQuery {
            search: "mit".into(),
            country: "USA".into(),
            ..Default::default()
        };
        assert!(query.matches(&s));

        let wrong_country = ScholarshipQuery {
            country: "usa".into(),
            ..Default::default()
        };
        assert!(!wrong_country.matches(&s));
    }

    #[test]
    fn test_page_count() {
        let query = ScholarshipQuery {
            limit: 8,
            ..Default::default()
        };
        assert_eq!(ScholarshipPage::new(vec![], 17, &query).pages, 3);
        assert_eq!(ScholarshipPage::new(vec![], 16, &query).pages, 2);
        assert_eq!(ScholarshipPage::new(vec![], 0, &query).pages, 0);
    }

    #[test]
    fn test_serializes_with_document_id() {
        let s = Scholarship::new(details("Rhodes", "UK", 10.0), "admin@x.io");
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("_id").is_some());
        assert_eq!(json["scholarshipName"], "Rhodes");
        assert_eq!(json["applicationFees"], 10.0);
    }
}
