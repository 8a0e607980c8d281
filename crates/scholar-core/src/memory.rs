//! # In-Memory Store
//!
//! A thread-safe store backed by vectors behind a single `RwLock`.
//! Used for local development when no database is configured, and by the
//! test suites. Uniqueness rules are checked under the write lock so they
//! hold for concurrent writers.

use crate::application::{Application, StatusUpdate, UniversityCount};
use crate::error::{StoreError, StoreResult};
use crate::id::DocumentId;
use crate::review::{Review, ReviewEdit};
use crate::scholarship::{FeeSort, Scholarship, ScholarshipDetails, ScholarshipPage, ScholarshipQuery};
use crate::store::{
    ApplicationRepository, ReviewRepository, ScholarshipRepository, UserRepository, APPLICATIONS,
    REVIEWS, SCHOLARSHIPS, USERS,
};
use crate::user::{LoginOutcome, LoginProfile, Role, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Collections {
    scholarships: Vec<Scholarship>,
    applications: Vec<Application>,
    users: Vec<User>,
    reviews: Vec<Review>,
}

#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(collection: &'static str, id: DocumentId) -> StoreError {
    StoreError::NotFound {
        collection,
        id: id.to_string(),
    }
}

#[async_trait]
impl ScholarshipRepository for MemoryStore {
    async fn insert_scholarship(&self, scholarship: Scholarship) -> StoreResult<DocumentId> {
        let id = scholarship.id;
        self.inner.write().await.scholarships.push(scholarship);
        Ok(id)
    }

    async fn all_scholarships(&self) -> StoreResult<Vec<Scholarship>> {
        Ok(self.inner.read().await.scholarships.clone())
    }

    async fn search_scholarships(&self, query: &ScholarshipQuery) -> StoreResult<ScholarshipPage> {
        let data = self.inner.read().await;
        let mut matched: Vec<&Scholarship> = data
            .scholarships
            .iter()
            .filter(|s| query.matches(s))
            .collect();

        // stable sort keeps posting order among equal fees
        match query.sort_by {
            FeeSort::Ascending => matched.sort_by(|a, b| {
                a.details
                    .application_fees
                    .total_cmp(&b.details.application_fees)
            }),
            FeeSort::Descending => matched.sort_by(|a, b| {
                b.details
                    .application_fees
                    .total_cmp(&a.details.application_fees)
            }),
            FeeSort::Unsorted => {}
        }

        let total = matched.len() as u64;
        let page = matched
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(ScholarshipPage::new(page, total, query))
    }

    async fn find_scholarship(&self, id: DocumentId) -> StoreResult<Option<Scholarship>> {
        let data = self.inner.read().await;
        Ok(data.scholarships.iter().find(|s| s.id == id).cloned())
    }

    async fn replace_scholarship(
        &self,
        id: DocumentId,
        details: ScholarshipDetails,
    ) -> StoreResult<Scholarship> {
        let mut data = self.inner.write().await;
        let existing = data
            .scholarships
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found(SCHOLARSHIPS, id))?;
        existing.details = details;
        Ok(existing.clone())
    }

    async fn delete_scholarship(&self, id: DocumentId) -> StoreResult<()> {
        let mut data = self.inner.write().await;
        let before = data.scholarships.len();
        data.scholarships.retain(|s| s.id != id);
        if data.scholarships.len() == before {
            return Err(not_found(SCHOLARSHIPS, id));
        }
        Ok(())
    }

    async fn count_scholarships(&self) -> StoreResult<u64> {
        Ok(self.inner.read().await.scholarships.len() as u64)
    }
}

#[async_trait]
impl ApplicationRepository for MemoryStore {
    async fn insert_application(&self, application: Application) -> StoreResult<DocumentId> {
        let mut data = self.inner.write().await;
        if data
            .applications
            .iter()
            .any(|a| a.transaction_id == application.transaction_id)
        {
            return Err(StoreError::Conflict {
                collection: APPLICATIONS,
                key: application.transaction_id,
            });
        }
        let id = application.id;
        data.applications.push(application);
        Ok(id)
    }

    async fn find_application_by_transaction(
        &self,
        transaction_id: &str,
    ) -> StoreResult<Option<Application>> {
        let data = self.inner.read().await;
        Ok(data
            .applications
            .iter()
            .find(|a| a.transaction_id == transaction_id)
            .cloned())
    }

    async fn all_applications(&self) -> StoreResult<Vec<Application>> {
        Ok(self.inner.read().await.applications.clone())
    }

    async fn applications_for_student(&self, email: &str) -> StoreResult<Vec<Application>> {
        let data = self.inner.read().await;
        Ok(data
            .applications
            .iter()
            .filter(|a| a.student_email == email)
            .cloned()
            .collect())
    }

    async fn update_application_status(
        &self,
        id: DocumentId,
        update: &StatusUpdate,
    ) -> StoreResult<Application> {
        let mut data = self.inner.write().await;
        let app = data
            .applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| not_found(APPLICATIONS, id))?;
        app.status = update.status;
        if update.feedback.is_some() {
            app.feedback = update.feedback.clone();
        }
        Ok(app.clone())
    }

    async fn total_application_fees(&self) -> StoreResult<f64> {
        let data = self.inner.read().await;
        Ok(data.applications.iter().map(|a| a.application_fees).sum())
    }

    async fn applications_per_university(&self) -> StoreResult<Vec<UniversityCount>> {
        let data = self.inner.read().await;
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for app in &data.applications {
            *counts.entry(app.university_name.as_str()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(name, applications)| UniversityCount {
                university_name: name.to_string(),
                applications,
            })
            .collect())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn record_login(
        &self,
        email: &str,
        profile: LoginProfile,
        at: DateTime<Utc>,
    ) -> StoreResult<LoginOutcome> {
        let mut data = self.inner.write().await;
        if let Some(existing) = data.users.iter_mut().find(|u| u.email == email) {
            existing.last_logged_in = at;
            return Ok(LoginOutcome::Updated(existing.clone()));
        }
        let user = User::first_login(email, profile, at);
        data.users.push(user.clone());
        Ok(LoginOutcome::Created(user))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|u| u.email == email).cloned())
    }

    async fn all_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.inner.read().await.users.clone())
    }

    async fn update_user_role(&self, id: DocumentId, role: Role) -> StoreResult<User> {
        let mut data = self.inner.write().await;
        let user = data
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| not_found(USERS, id))?;
        user.role = role;
        Ok(user.clone())
    }

    async fn delete_user(&self, id: DocumentId) -> StoreResult<()> {
        let mut data = self.inner.write().await;
        let before = data.users.len();
        data.users.retain(|u| u.id != id);
        if data.users.len() == before {
            return Err(not_found(USERS, id));
        }
        Ok(())
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(self.inner.read().await.users.len() as u64)
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn insert_review(&self, review: Review) -> StoreResult<DocumentId> {
        let mut data = self.inner.write().await;
        if data.reviews.iter().any(|r| {
            r.application_id == review.application_id && r.student_email == review.student_email
        }) {
            return Err(StoreError::Conflict {
                collection: REVIEWS,
                key: format!("{}/{}", review.application_id, review.student_email),
            });
        }
        let id = review.id;
        data.reviews.push(review);
        Ok(id)
    }

    async fn find_review(&self, id: DocumentId) -> StoreResult<Option<Review>> {
        let data = self.inner.read().await;
        Ok(data.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn all_reviews(&self) -> StoreResult<Vec<Review>> {
        Ok(self.inner.read().await.reviews.clone())
    }

    async fn reviews_by_student(&self, email: &str) -> StoreResult<Vec<Review>> {
        let data = self.inner.read().await;
        Ok(data
            .reviews
            .iter()
            .filter(|r| r.student_email == email)
            .cloned()
            .collect())
    }

    async fn edit_review(&self, id: DocumentId, edit: &ReviewEdit) -> StoreResult<Review> {
        let mut data = self.inner.write().await;
        let review = data
            .reviews
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found(REVIEWS, id))?;
        review.rating = edit.rating;
        review.comment = edit.comment.clone();
        Ok(review.clone())
    }

    async fn delete_review(&self, id: DocumentId) -> StoreResult<()> {
        let mut data = self.inner.write().await;
        let before = data.reviews.len();
        data.reviews.retain(|r| r.id != id);
        if data.reviews.len() == before {
            return Err(not_found(REVIEWS, id));
        }
        Ok(())
    }

    async fn delete_student_review(&self, id: DocumentId, email: &str) -> StoreResult<()> {
        let mut data = self.inner.write().await;
        let before = data.reviews.len();
        data.reviews
            .retain(|r| !(r.id == id && r.student_email == email));
        if data.reviews.len() == before {
            return Err(not_found(REVIEWS, id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{ApplicationStatus, PaidCheckout};
    use crate::review::NewReview;
    use crate::scholarship::tests::details;

    fn application(scholarship: &Scholarship, tx: &str) -> Application {
        Application::from_payment(
            scholarship,
            PaidCheckout {
                transaction_id: tx.to_string(),
                student_name: "Ada".into(),
                student_email: "ada@x.io".into(),
                payment_status: "paid".into(),
                amount: scholarship.details.application_fees,
            },
        )
    }

    #[tokio::test]
    async fn test_search_filters_sorts_and_pages() {
        let store = MemoryStore::new();
        // 20 matching USA "MIT" scholarships with distinct fees, plus noise
        for i in 0..20 {
            let s = Scholarship::new(details(&format!("MIT Grant {}", i), "USA", i as f64), "a@x.io");
            store.insert_scholarship(s).await.unwrap();
        }
        store
            .insert_scholarship(Scholarship::new(details("MIT Abroad", "UK", 500.0), "a@x.io"))
            .await
            .unwrap();
        store
            .insert_scholarship(Scholarship::new(details("Harvard", "USA", 900.0), "a@x.io"))
            .await
            .unwrap();

        let query = ScholarshipQuery {
            search: "MIT".into(),
            country: "USA".into(),
            sort_by: FeeSort::Descending,
            page: 2,
            limit: 8,
        };
        let page = store.search_scholarships(&query).await.unwrap();

        assert_eq!(page.total, 20);
        assert_eq!(page.pages, 3);
        assert_eq!(page.current_page, 2);
        let fees: Vec<f64> = page
            .scholarships
            .iter()
            .map(|s| s.details.application_fees)
            .collect();
        // documents 9..=16 of the descending order 19,18,...
        assert_eq!(fees, vec![11.0, 10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0]);
    }

    #[tokio::test]
    async fn test_replace_keeps_identity() {
        let store = MemoryStore::new();
        let original = Scholarship::new(details("Rhodes", "UK", 10.0), "a@x.io");
        let id = store.insert_scholarship(original.clone()).await.unwrap();

        let replaced = store
            .replace_scholarship(id, details("Rhodes II", "UK", 12.0))
            .await
            .unwrap();
        assert_eq!(replaced.id, id);
        assert_eq!(replaced.posted_at, original.posted_at);
        assert_eq!(replaced.details.scholarship_name, "Rhodes II");

        let missing = store
            .replace_scholarship(DocumentId::new(), details("X", "UK", 1.0))
            .await
            .unwrap_err();
        assert!(matches!(missing, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_application_transaction_id_unique() {
        let store = MemoryStore::new();
        let scholarship = Scholarship::new(details("Rhodes", "UK", 10.0), "a@x.io");

        store
            .insert_application(application(&scholarship, "pi_1"))
            .await
            .unwrap();
        let err = store
            .insert_application(application(&scholarship, "pi_1"))
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(store.all_applications().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_aggregations() {
        let store = MemoryStore::new();
        let a = Scholarship::new(details("Alpha", "UK", 10.0), "a@x.io");
        let b = Scholarship::new(details("Beta", "UK", 25.5), "a@x.io");
        store.insert_application(application(&a, "pi_1")).await.unwrap();
        store.insert_application(application(&a, "pi_2")).await.unwrap();
        store.insert_application(application(&b, "pi_3")).await.unwrap();

        assert_eq!(store.total_application_fees().await.unwrap(), 45.5);
        let chart = store.applications_per_university().await.unwrap();
        assert_eq!(
            chart,
            vec![
                UniversityCount {
                    university_name: "Alpha University".into(),
                    applications: 2
                },
                UniversityCount {
                    university_name: "Beta University".into(),
                    applications: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_status_update() {
        let store = MemoryStore::new();
        let s = Scholarship::new(details("Alpha", "UK", 10.0), "a@x.io");
        let id = store.insert_application(application(&s, "pi_1")).await.unwrap();

        let updated = store
            .update_application_status(
                id,
                &StatusUpdate {
                    status: ApplicationStatus::Completed,
                    feedback: Some("Welcome aboard".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, ApplicationStatus::Completed);
        assert_eq!(updated.feedback.as_deref(), Some("Welcome aboard"));
    }

    #[tokio::test]
    async fn test_login_upsert() {
        let store = MemoryStore::new();
        let first = Utc::now();
        let created = store
            .record_login("s@x.io", LoginProfile::default(), first)
            .await
            .unwrap();
        assert!(created.is_new());

        let later = first + chrono::Duration::minutes(5);
        let updated = store
            .record_login(
                "s@x.io",
                LoginProfile {
                    name: "Renamed".into(),
                    image: None,
                },
                later,
            )
            .await
            .unwrap();
        assert!(!updated.is_new());
        let user = updated.user();
        assert_eq!(user.created_at, first);
        assert_eq!(user.last_logged_in, later);
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.name, "");
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_review_pair_unique_and_owner_delete() {
        let store = MemoryStore::new();
        let app_id = DocumentId::new();
        let submission = NewReview {
            application_id: app_id,
            student_name: None,
            scholarship_name: None,
            university_name: None,
            rating: 5,
            comment: "Great".into(),
        };
        let id = store
            .insert_review(Review::new(submission.clone(), "me@x.io"))
            .await
            .unwrap();
        let dup = store
            .insert_review(Review::new(submission.clone(), "me@x.io"))
            .await
            .unwrap_err();
        assert!(dup.is_conflict());

        // another student may review the same application
        store
            .insert_review(Review::new(submission, "you@x.io"))
            .await
            .unwrap();

        assert!(store.delete_student_review(id, "you@x.io").await.is_err());
        store.delete_student_review(id, "me@x.io").await.unwrap();
        assert_eq!(store.all_reviews().await.unwrap().len(), 1);
    }
}
