//! Row structs as they come out of Postgres, and their conversion into
//! domain documents. Text-encoded enums are parsed here; a value the domain
//! does not know is a backend error.

use chrono::{DateTime, Utc};
use scholar_core::{
    Application, ApplicationStatus, DocumentId, Review, Role, Scholarship, ScholarshipDetails,
    StoreError, UniversityCount, User,
};
use sqlx::FromRow;
use uuid::Uuid;

pub(crate) const SCHOLARSHIP_COLUMNS: &str = "id, scholarship_name, university_name, \
    university_image, country, city, world_rank, degree, subject_category, scholarship_category, \
    application_fees, service_charge, deadline, moderator_name, moderator_email, images, \
    posted_at, posted_by";

pub(crate) const APPLICATION_COLUMNS: &str = "id, scholarship_id, transaction_id, student_name, \
    student_email, status, payment_status, amount, scholarship_name, university_name, \
    application_fees, country, city, degree, subject_category, feedback, applied_at";

pub(crate) const USER_COLUMNS: &str = "id, email, name, image, role, created_at, last_logged_in";

pub(crate) const REVIEW_COLUMNS: &str = "id, application_id, student_email, student_name, \
    scholarship_name, university_name, rating, comment, created_at";

#[derive(Debug, FromRow)]
pub(crate) struct ScholarshipRow {
    pub id: Uuid,
    pub scholarship_name: String,
    pub university_name: String,
    pub university_image: Option<String>,
    pub country: String,
    pub city: String,
    pub world_rank: Option<i32>,
    pub degree: String,
    pub subject_category: String,
    pub scholarship_category: Option<String>,
    pub application_fees: f64,
    pub service_charge: Option<f64>,
    pub deadline: Option<String>,
    pub moderator_name: Option<String>,
    pub moderator_email: Option<String>,
    pub images: Vec<String>,
    pub posted_at: DateTime<Utc>,
    pub posted_by: String,
}

impl From<ScholarshipRow> for Scholarship {
    fn from(row: ScholarshipRow) -> Self {
        Scholarship {
            id: DocumentId::from_uuid(row.id),
            details: ScholarshipDetails {
                scholarship_name: row.scholarship_name,
                university_name: row.university_name,
                university_image: row.university_image,
                country: row.country,
                city: row.city,
                world_rank: row.world_rank,
                degree: row.degree,
                subject_category: row.subject_category,
                scholarship_category: row.scholarship_category,
                application_fees: row.application_fees,
                service_charge: row.service_charge,
                deadline: row.deadline,
                moderator_name: row.moderator_name,
                moderator_email: row.moderator_email,
                images: row.images,
            },
            posted_at: row.posted_at,
            posted_by: row.posted_by,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ApplicationRow {
    pub id: Uuid,
    pub scholarship_id: Uuid,
    pub transaction_id: String,
    pub student_name: String,
    pub student_email: String,
    pub status: String,
    pub payment_status: String,
    pub amount: f64,
    pub scholarship_name: String,
    pub university_name: String,
    pub application_fees: f64,
    pub country: String,
    pub city: String,
    pub degree: String,
    pub subject_category: String,
    pub feedback: Option<String>,
    pub applied_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = StoreError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let status = ApplicationStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Backend(format!("unknown application status '{}'", row.status))
        })?;

        Ok(Application {
            id: DocumentId::from_uuid(row.id),
            scholarship_id: DocumentId::from_uuid(row.scholarship_id),
            transaction_id: row.transaction_id,
            student_name: row.student_name,
            student_email: row.student_email,
            status,
            payment_status: row.payment_status,
            amount: row.amount,
            scholarship_name: row.scholarship_name,
            university_name: row.university_name,
            application_fees: row.application_fees,
            country: row.country,
            city: row.city,
            degree: row.degree,
            subject_category: row.subject_category,
            feedback: row.feedback,
            applied_at: row.applied_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub last_logged_in: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| StoreError::Backend(format!("unknown role '{}'", row.role)))?;

        Ok(User {
            id: DocumentId::from_uuid(row.id),
            email: row.email,
            name: row.name,
            image: row.image,
            role,
            created_at: row.created_at,
            last_logged_in: row.last_logged_in,
        })
    }
}

/// Upsert result: the row plus whether Postgres inserted it
#[derive(Debug, FromRow)]
pub(crate) struct LoginRow {
    #[sqlx(flatten)]
    pub user: UserRow,
    pub inserted: bool,
}

#[derive(Debug, FromRow)]
pub(crate) struct ReviewRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub student_email: String,
    pub student_name: Option<String>,
    pub scholarship_name: Option<String>,
    pub university_name: Option<String>,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating)
            .map_err(|_| StoreError::Backend(format!("rating out of range: {}", row.rating)))?;

        Ok(Review {
            id: DocumentId::from_uuid(row.id),
            application_id: DocumentId::from_uuid(row.application_id),
            student_email: row.student_email,
            student_name: row.student_name,
            scholarship_name: row.scholarship_name,
            university_name: row.university_name,
            rating,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct UniversityCountRow {
    pub university_name: String,
    pub applications: i64,
}

impl From<UniversityCountRow> for UniversityCount {
    fn from(row: UniversityCountRow) -> Self {
        UniversityCount {
            university_name: row.university_name,
            applications: row.applications.max(0) as u64,
        }
    }
}

/// Convert a batch of rows, failing on the first bad one
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_row(role: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "ada@x.io".into(),
            name: "Ada".into(),
            image: None,
            role: role.into(),
            created_at: Utc::now(),
            last_logged_in: Utc::now(),
        }
    }

    #[test]
    fn test_user_role_parsing() {
        let user = User::try_from(user_row("Moderator")).unwrap();
        assert_eq!(user.role, Role::Moderator);

        let err = User::try_from(user_row("superuser")).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn test_review_rating_range() {
        let row = ReviewRow {
            id: Uuid::new_v4(),
            application_id: Uuid::new_v4(),
            student_email: "ada@x.io".into(),
            student_name: None,
            scholarship_name: None,
            university_name: None,
            rating: -1,
            comment: "".into(),
            created_at: Utc::now(),
        };
        assert!(Review::try_from(row).is_err());
    }
}
