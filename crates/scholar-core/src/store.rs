//! # Repository Traits
//!
//! One trait per collection. Adapters implement all four and are handed to
//! the HTTP layer as a single [`SharedStore`].
//!
//! Uniqueness rules are the adapter's job: `insert_application` must reject a
//! second application for the same transaction id and `insert_review` a
//! second review for the same (application, student) pair, both with
//! `StoreError::Conflict`. Callers rely on that instead of read-then-write
//! checks.

use crate::application::{Application, StatusUpdate, UniversityCount};
use crate::error::StoreResult;
use crate::id::DocumentId;
use crate::review::{Review, ReviewEdit};
use crate::scholarship::{Scholarship, ScholarshipDetails, ScholarshipPage, ScholarshipQuery};
use crate::user::{LoginOutcome, LoginProfile, Role, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const SCHOLARSHIPS: &str = "scholarship";
pub const APPLICATIONS: &str = "application";
pub const USERS: &str = "user";
pub const REVIEWS: &str = "review";

#[async_trait]
pub trait ScholarshipRepository: Send + Sync {
    async fn insert_scholarship(&self, scholarship: Scholarship) -> StoreResult<DocumentId>;

    async fn all_scholarships(&self) -> StoreResult<Vec<Scholarship>>;

    /// Filtered, sorted, paged listing; `total` counts the whole filtered set
    async fn search_scholarships(&self, query: &ScholarshipQuery) -> StoreResult<ScholarshipPage>;

    async fn find_scholarship(&self, id: DocumentId) -> StoreResult<Option<Scholarship>>;

    /// Replace every administrator-supplied field, keeping id and posting info
    async fn replace_scholarship(
        &self,
        id: DocumentId,
        details: ScholarshipDetails,
    ) -> StoreResult<Scholarship>;

    async fn delete_scholarship(&self, id: DocumentId) -> StoreResult<()>;

    async fn count_scholarships(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Fails with `Conflict` when the transaction id is already recorded
    async fn insert_application(&self, application: Application) -> StoreResult<DocumentId>;

    async fn find_application_by_transaction(
        &self,
        transaction_id: &str,
    ) -> StoreResult<Option<Application>>;

    async fn all_applications(&self) -> StoreResult<Vec<Application>>;

    async fn applications_for_student(&self, email: &str) -> StoreResult<Vec<Application>>;

    async fn update_application_status(
        &self,
        id: DocumentId,
        update: &StatusUpdate,
    ) -> StoreResult<Application>;

    /// Sum of `applicationFees` across every application
    async fn total_application_fees(&self) -> StoreResult<f64>;

    /// Application count grouped by university name
    async fn applications_per_university(&self) -> StoreResult<Vec<UniversityCount>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a student account on first login, otherwise touch only
    /// `last_logged_in`. Must be atomic per email.
    async fn record_login(
        &self,
        email: &str,
        profile: LoginProfile,
        at: DateTime<Utc>,
    ) -> StoreResult<LoginOutcome>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn all_users(&self) -> StoreResult<Vec<User>>;

    async fn update_user_role(&self, id: DocumentId, role: Role) -> StoreResult<User>;

    async fn delete_user(&self, id: DocumentId) -> StoreResult<()>;

    async fn count_users(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Fails with `Conflict` when the student already reviewed the application
    async fn insert_review(&self, review: Review) -> StoreResult<DocumentId>;

    async fn find_review(&self, id: DocumentId) -> StoreResult<Option<Review>>;

    async fn all_reviews(&self) -> StoreResult<Vec<Review>>;

    async fn reviews_by_student(&self, email: &str) -> StoreResult<Vec<Review>>;

    async fn edit_review(&self, id: DocumentId, edit: &ReviewEdit) -> StoreResult<Review>;

    async fn delete_review(&self, id: DocumentId) -> StoreResult<()>;

    /// Delete only if the review belongs to `email`; `NotFound` otherwise
    async fn delete_student_review(&self, id: DocumentId, email: &str) -> StoreResult<()>;
}

/// Everything the HTTP layer needs from storage
pub trait Store:
    ScholarshipRepository + ApplicationRepository + UserRepository + ReviewRepository
{
}

impl<T> Store for T where
    T: ScholarshipRepository + ApplicationRepository + UserRepository + ReviewRepository
{
}

/// Shared handle to the store (dynamic dispatch)
pub type SharedStore = Arc<dyn Store>;
