use super::{DeletedResponse, InsertedResponse};
use crate::auth::{Caller, Guarded, Moderator};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use scholar_core::review::validate_rating;
use scholar_core::{authorize, DocumentId, NewReview, Review, ReviewEdit, Role};
use tracing::{info, instrument};

/// POST /reviews
#[instrument(skip(state, caller, submission), fields(student = %caller.email()))]
pub async fn create_review(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(submission): ApiJson<NewReview>,
) -> ApiResult<Json<InsertedResponse>> {
    validate_rating(submission.rating).map_err(ApiError::Validation)?;

    let review = Review::new(submission, caller.email());
    let inserted_id = state.store.insert_review(review).await?;
    info!("Review {} added", inserted_id);

    Ok(Json(InsertedResponse { inserted_id }))
}

/// GET /reviews
pub async fn list_reviews(
    State(state): State<AppState>,
    _guard: Guarded<Moderator>,
) -> ApiResult<Json<Vec<Review>>> {
    Ok(Json(state.store.all_reviews().await?))
}

/// GET /my-reviews
pub async fn my_reviews(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<Review>>> {
    Ok(Json(state.store.reviews_by_student(caller.email()).await?))
}

/// PATCH /reviews/{id}: the author or any moderator
#[instrument(skip(state, caller, edit), fields(caller = %caller.email()))]
pub async fn edit_review(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<DocumentId>,
    ApiJson(edit): ApiJson<ReviewEdit>,
) -> ApiResult<Json<Review>> {
    validate_rating(edit.rating).map_err(ApiError::Validation)?;

    let review = state
        .store
        .find_review(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("review not found: {}", id)))?;

    if !review.is_owned_by(caller.email()) {
        let user = state.store.find_user_by_email(caller.email()).await?;
        authorize(user.as_ref(), Role::Moderator)?;
    }

    Ok(Json(state.store.edit_review(id, &edit).await?))
}

/// DELETE /reviews/{id}
#[instrument(skip(state, guard), fields(moderator = %guard.caller.email()))]
pub async fn delete_review(
    State(state): State<AppState>,
    guard: Guarded<Moderator>,
    ApiPath(id): ApiPath<DocumentId>,
) -> ApiResult<Json<DeletedResponse>> {
    state.store.delete_review(id).await?;
    info!("Review {} deleted", id);
    Ok(DeletedResponse::one())
}

/// DELETE /my-reviews/{id}
#[instrument(skip(state, caller), fields(student = %caller.email()))]
pub async fn delete_my_review(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<DocumentId>,
) -> ApiResult<Json<DeletedResponse>> {
    state.store.delete_student_review(id, caller.email()).await?;
    Ok(DeletedResponse::one())
}
