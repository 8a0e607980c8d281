//! # Review Types

use crate::id::DocumentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub application_id: DocumentId,
    pub student_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scholarship_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university_name: Option<String>,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Review submission; the author is always the authenticated caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub application_id: DocumentId,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub scholarship_name: Option<String>,
    #[serde(default)]
    pub university_name: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

/// Editable review fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEdit {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

pub fn validate_rating(rating: u8) -> Result<(), String> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(format!("rating must be between {} and {}", MIN_RATING, MAX_RATING))
    }
}

impl Review {
    pub fn new(submission: NewReview, student_email: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            application_id: submission.application_id,
            student_email: student_email.into(),
            student_name: submission.student_name,
            scholarship_name: submission.scholarship_name,
            university_name: submission.university_name,
            rating: submission.rating,
            comment: submission.comment,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.student_email == email
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_new_review_takes_caller_as_author() {
        let submission = NewReview {
            application_id: DocumentId::new(),
            student_name: None,
            scholarship_name: None,
            university_name: None,
            rating: 4,
            comment: "Smooth process".into(),
        };
        let review = Review::new(submission, "me@x.io");
        assert!(review.is_owned_by("me@x.io"));
        assert!(!review.is_owned_by("you@x.io"));
    }
}
