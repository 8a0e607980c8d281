//! # PostgreSQL Store
//!
//! Implements the four repository traits over a `PgPool`. Uniqueness rules
//! are enforced by table constraints; a unique violation comes back as
//! `StoreError::Conflict`.

use crate::rows::{
    convert_all, ApplicationRow, LoginRow, ReviewRow, ScholarshipRow, UniversityCountRow, UserRow,
    APPLICATION_COLUMNS, REVIEW_COLUMNS, SCHOLARSHIP_COLUMNS, USER_COLUMNS,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scholar_core::store::{APPLICATIONS, REVIEWS, SCHOLARSHIPS, USERS};
use scholar_core::{
    Application, ApplicationRepository, DocumentId, FeeSort, LoginOutcome, LoginProfile, Review,
    ReviewEdit, ReviewRepository, Role, Scholarship, ScholarshipDetails, ScholarshipPage,
    ScholarshipQuery, ScholarshipRepository, StatusUpdate, StoreError, StoreResult,
    UniversityCount, User, UserRepository,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Repository adapter backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a pool against `url`
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(backend)?;

        info!("Connected to PostgreSQL (max_connections={})", max_connections);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {}", e)))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Map a write error, turning unique violations into `Conflict`
fn write_error(e: sqlx::Error, collection: &'static str, key: String) -> StoreError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return StoreError::Conflict { collection, key };
        }
    }
    backend(e)
}

fn not_found(collection: &'static str, id: DocumentId) -> StoreError {
    StoreError::NotFound {
        collection,
        id: id.to_string(),
    }
}

fn count(n: i64) -> u64 {
    n.max(0) as u64
}

/// Escape `%`, `_` and `\` so a search term matches literally under ILIKE
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ScholarshipQuery) {
    builder.push(" WHERE TRUE");
    if let Some(term) = query.search_term() {
        builder
            .push(" AND scholarship_name ILIKE ")
            .push_bind(format!("%{}%", escape_like(term)));
    }
    if let Some(country) = query.country_filter() {
        builder.push(" AND country = ").push_bind(country.to_string());
    }
}

/// Fee ordering; ties keep posting order
fn order_clause(sort: FeeSort) -> &'static str {
    match sort {
        FeeSort::Ascending => " ORDER BY application_fees ASC, posted_at ASC, id ASC",
        FeeSort::Descending => " ORDER BY application_fees DESC, posted_at ASC, id ASC",
        FeeSort::Unsorted => " ORDER BY posted_at ASC, id ASC",
    }
}

#[async_trait]
impl ScholarshipRepository for PgStore {
    #[instrument(skip(self, scholarship), fields(id = %scholarship.id))]
    async fn insert_scholarship(&self, scholarship: Scholarship) -> StoreResult<DocumentId> {
        let d = &scholarship.details;
        sqlx::query(&format!(
            "INSERT INTO scholarships ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
            SCHOLARSHIP_COLUMNS
        ))
        .bind(scholarship.id.as_uuid())
        .bind(&d.scholarship_name)
        .bind(&d.university_name)
        .bind(&d.university_image)
        .bind(&d.country)
        .bind(&d.city)
        .bind(d.world_rank)
        .bind(&d.degree)
        .bind(&d.subject_category)
        .bind(&d.scholarship_category)
        .bind(d.application_fees)
        .bind(d.service_charge)
        .bind(&d.deadline)
        .bind(&d.moderator_name)
        .bind(&d.moderator_email)
        .bind(&d.images)
        .bind(scholarship.posted_at)
        .bind(&scholarship.posted_by)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, SCHOLARSHIPS, scholarship.id.to_string()))?;

        Ok(scholarship.id)
    }

    async fn all_scholarships(&self) -> StoreResult<Vec<Scholarship>> {
        let rows: Vec<ScholarshipRow> = sqlx::query_as(&format!(
            "SELECT {} FROM scholarships ORDER BY posted_at ASC, id ASC",
            SCHOLARSHIP_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(Scholarship::from).collect())
    }

    #[instrument(skip(self))]
    async fn search_scholarships(&self, query: &ScholarshipQuery) -> StoreResult<ScholarshipPage> {
        let mut counter = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM scholarships");
        push_filters(&mut counter, query);
        let total: i64 = counter
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM scholarships", SCHOLARSHIP_COLUMNS));
        push_filters(&mut select, query);
        select.push(order_clause(query.sort_by));
        select
            .push(" LIMIT ")
            .push_bind(i64::try_from(query.limit).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));

        let rows: Vec<ScholarshipRow> = select
            .build_query_as::<ScholarshipRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        debug!("Search matched {} scholarships, returning {}", total, rows.len());

        Ok(ScholarshipPage::new(
            rows.into_iter().map(Scholarship::from).collect(),
            count(total),
            query,
        ))
    }

    async fn find_scholarship(&self, id: DocumentId) -> StoreResult<Option<Scholarship>> {
        let row: Option<ScholarshipRow> = sqlx::query_as(&format!(
            "SELECT {} FROM scholarships WHERE id = $1",
            SCHOLARSHIP_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(Scholarship::from))
    }

    #[instrument(skip(self, details))]
    async fn replace_scholarship(
        &self,
        id: DocumentId,
        details: ScholarshipDetails,
    ) -> StoreResult<Scholarship> {
        let row: Option<ScholarshipRow> = sqlx::query_as(&format!(
            "UPDATE scholarships SET scholarship_name = $2, university_name = $3, \
             university_image = $4, country = $5, city = $6, world_rank = $7, degree = $8, \
             subject_category = $9, scholarship_category = $10, application_fees = $11, \
             service_charge = $12, deadline = $13, moderator_name = $14, moderator_email = $15, \
             images = $16 WHERE id = $1 RETURNING {}",
            SCHOLARSHIP_COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(&details.scholarship_name)
        .bind(&details.university_name)
        .bind(&details.university_image)
        .bind(&details.country)
        .bind(&details.city)
        .bind(details.world_rank)
        .bind(&details.degree)
        .bind(&details.subject_category)
        .bind(&details.scholarship_category)
        .bind(details.application_fees)
        .bind(details.service_charge)
        .bind(&details.deadline)
        .bind(&details.moderator_name)
        .bind(&details.moderator_email)
        .bind(&details.images)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(Scholarship::from)
            .ok_or_else(|| not_found(SCHOLARSHIPS, id))
    }

    async fn delete_scholarship(&self, id: DocumentId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM scholarships WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(not_found(SCHOLARSHIPS, id));
        }
        Ok(())
    }

    async fn count_scholarships(&self) -> StoreResult<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scholarships")
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        Ok(count(n))
    }
}

#[async_trait]
impl ApplicationRepository for PgStore {
    #[instrument(skip(self, application), fields(transaction_id = %application.transaction_id))]
    async fn insert_application(&self, application: Application) -> StoreResult<DocumentId> {
        sqlx::query(&format!(
            "INSERT INTO applications ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
            APPLICATION_COLUMNS
        ))
        .bind(application.id.as_uuid())
        .bind(application.scholarship_id.as_uuid())
        .bind(&application.transaction_id)
        .bind(&application.student_name)
        .bind(&application.student_email)
        .bind(application.status.as_str())
        .bind(&application.payment_status)
        .bind(application.amount)
        .bind(&application.scholarship_name)
        .bind(&application.university_name)
        .bind(application.application_fees)
        .bind(&application.country)
        .bind(&application.city)
        .bind(&application.degree)
        .bind(&application.subject_category)
        .bind(&application.feedback)
        .bind(application.applied_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, APPLICATIONS, application.transaction_id.clone()))?;

        Ok(application.id)
    }

    async fn find_application_by_transaction(
        &self,
        transaction_id: &str,
    ) -> StoreResult<Option<Application>> {
        let row: Option<ApplicationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM applications WHERE transaction_id = $1",
            APPLICATION_COLUMNS
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(Application::try_from).transpose()
    }

    async fn all_applications(&self) -> StoreResult<Vec<Application>> {
        let rows: Vec<ApplicationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM applications ORDER BY applied_at ASC, id ASC",
            APPLICATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        convert_all(rows)
    }

    async fn applications_for_student(&self, email: &str) -> StoreResult<Vec<Application>> {
        let rows: Vec<ApplicationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM applications WHERE student_email = $1 ORDER BY applied_at ASC, id ASC",
            APPLICATION_COLUMNS
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        convert_all(rows)
    }

    async fn update_application_status(
        &self,
        id: DocumentId,
        update: &StatusUpdate,
    ) -> StoreResult<Application> {
        let row: Option<ApplicationRow> = sqlx::query_as(&format!(
            "UPDATE applications SET status = $2, feedback = COALESCE($3, feedback) \
             WHERE id = $1 RETURNING {}",
            APPLICATION_COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(update.status.as_str())
        .bind(&update.feedback)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(Application::try_from)
            .transpose()?
            .ok_or_else(|| not_found(APPLICATIONS, id))
    }

    async fn total_application_fees(&self) -> StoreResult<f64> {
        sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(SUM(application_fees), 0)::DOUBLE PRECISION FROM applications",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(backend)
    }

    async fn applications_per_university(&self) -> StoreResult<Vec<UniversityCount>> {
        let rows: Vec<UniversityCountRow> = sqlx::query_as(
            "SELECT university_name, COUNT(*) AS applications FROM applications \
             GROUP BY university_name ORDER BY university_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(UniversityCount::from).collect())
    }
}

#[async_trait]
impl UserRepository for PgStore {
    #[instrument(skip(self, profile))]
    async fn record_login(
        &self,
        email: &str,
        profile: LoginProfile,
        at: DateTime<Utc>,
    ) -> StoreResult<LoginOutcome> {
        let candidate = User::first_login(email, profile, at);

        // xmax is zero only for a freshly inserted tuple
        let row: LoginRow = sqlx::query_as(&format!(
            "INSERT INTO users ({}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (email) DO UPDATE SET last_logged_in = EXCLUDED.last_logged_in \
             RETURNING {}, (xmax = 0) AS inserted",
            USER_COLUMNS, USER_COLUMNS
        ))
        .bind(candidate.id.as_uuid())
        .bind(&candidate.email)
        .bind(&candidate.name)
        .bind(&candidate.image)
        .bind(candidate.role.as_str())
        .bind(candidate.created_at)
        .bind(candidate.last_logged_in)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        let user = User::try_from(row.user)?;
        Ok(if row.inserted {
            LoginOutcome::Created(user)
        } else {
            LoginOutcome::Updated(user)
        })
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        row.map(User::try_from).transpose()
    }

    async fn all_users(&self) -> StoreResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users ORDER BY created_at ASC, id ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        convert_all(rows)
    }

    async fn update_user_role(&self, id: DocumentId, role: Role) -> StoreResult<User> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(User::try_from)
            .transpose()?
            .ok_or_else(|| not_found(USERS, id))
    }

    async fn delete_user(&self, id: DocumentId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(not_found(USERS, id));
        }
        Ok(())
    }

    async fn count_users(&self) -> StoreResult<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        Ok(count(n))
    }
}

#[async_trait]
impl ReviewRepository for PgStore {
    #[instrument(skip(self, review), fields(application_id = %review.application_id))]
    async fn insert_review(&self, review: Review) -> StoreResult<DocumentId> {
        sqlx::query(&format!(
            "INSERT INTO reviews ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            REVIEW_COLUMNS
        ))
        .bind(review.id.as_uuid())
        .bind(review.application_id.as_uuid())
        .bind(&review.student_email)
        .bind(&review.student_name)
        .bind(&review.scholarship_name)
        .bind(&review.university_name)
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            write_error(
                e,
                REVIEWS,
                format!("{}/{}", review.application_id, review.student_email),
            )
        })?;

        Ok(review.id)
    }

    async fn find_review(&self, id: DocumentId) -> StoreResult<Option<Review>> {
        let row: Option<ReviewRow> =
            sqlx::query_as(&format!("SELECT {} FROM reviews WHERE id = $1", REVIEW_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        row.map(Review::try_from).transpose()
    }

    async fn all_reviews(&self) -> StoreResult<Vec<Review>> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reviews ORDER BY created_at ASC, id ASC",
            REVIEW_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        convert_all(rows)
    }

    async fn reviews_by_student(&self, email: &str) -> StoreResult<Vec<Review>> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reviews WHERE student_email = $1 ORDER BY created_at ASC, id ASC",
            REVIEW_COLUMNS
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        convert_all(rows)
    }

    async fn edit_review(&self, id: DocumentId, edit: &ReviewEdit) -> StoreResult<Review> {
        let row: Option<ReviewRow> = sqlx::query_as(&format!(
            "UPDATE reviews SET rating = $2, comment = $3 WHERE id = $1 RETURNING {}",
            REVIEW_COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(i16::from(edit.rating))
        .bind(&edit.comment)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(Review::try_from)
            .transpose()?
            .ok_or_else(|| not_found(REVIEWS, id))
    }

    async fn delete_review(&self, id: DocumentId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(not_found(REVIEWS, id));
        }
        Ok(())
    }

    async fn delete_student_review(&self, id: DocumentId, email: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1 AND student_email = $2")
            .bind(id.as_uuid())
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(not_found(REVIEWS, id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("MIT"), "MIT");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }

    #[test]
    fn test_order_clause() {
        assert!(order_clause(FeeSort::Ascending).contains("application_fees ASC"));
        assert!(order_clause(FeeSort::Descending).contains("application_fees DESC"));
        assert!(!order_clause(FeeSort::Unsorted).contains("application_fees"));
    }

    #[test]
    fn test_filters_bind_only_present_terms() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM scholarships");
        push_filters(&mut builder, &ScholarshipQuery::default());
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM scholarships WHERE TRUE");

        let query = ScholarshipQuery {
            search: " rhodes ".into(),
            country: "UK".into(),
            ..ScholarshipQuery::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM scholarships");
        push_filters(&mut builder, &query);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM scholarships WHERE TRUE \
             AND scholarship_name ILIKE $1 AND country = $2"
        );
    }
}
