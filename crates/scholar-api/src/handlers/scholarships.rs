use super::{DeletedResponse, InsertedResponse};
use crate::auth::{Admin, Guarded};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use scholar_core::{DocumentId, Scholarship, ScholarshipDetails, ScholarshipPage, ScholarshipQuery};
use tracing::{info, instrument};

/// POST /scholarships
#[instrument(skip_all, fields(admin = %guard.caller.email()))]
pub async fn create_scholarship(
    State(state): State<AppState>,
    guard: Guarded<Admin>,
    ApiJson(details): ApiJson<ScholarshipDetails>,
) -> ApiResult<Json<InsertedResponse>> {
    details.validate().map_err(ApiError::Validation)?;

    let scholarship = Scholarship::new(details, guard.caller.email());
    let inserted_id = state.store.insert_scholarship(scholarship).await?;
    info!("Scholarship {} posted", inserted_id);

    Ok(Json(InsertedResponse { inserted_id }))
}

/// GET /scholarships
pub async fn list_scholarships(
    State(state): State<AppState>,
    _guard: Guarded<Admin>,
) -> ApiResult<Json<Vec<Scholarship>>> {
    Ok(Json(state.store.all_scholarships().await?))
}

/// GET /allscholarships
#[instrument(skip(state))]
pub async fn search_scholarships(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ScholarshipQuery>,
) -> ApiResult<Json<ScholarshipPage>> {
    query.validate().map_err(ApiError::Validation)?;
    Ok(Json(state.store.search_scholarships(&query).await?))
}

/// GET /scholarships/{id}
pub async fn get_scholarship(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DocumentId>,
) -> ApiResult<Json<Scholarship>> {
    state
        .store
        .find_scholarship(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("scholarship not found: {}", id)))
}

/// PUT /scholarships/{id}
#[instrument(skip(state, _guard, details))]
pub async fn replace_scholarship(
    State(state): State<AppState>,
    _guard: Guarded<Admin>,
    ApiPath(id): ApiPath<DocumentId>,
    ApiJson(details): ApiJson<ScholarshipDetails>,
) -> ApiResult<Json<Scholarship>> {
    details.validate().map_err(ApiError::Validation)?;
    Ok(Json(state.store.replace_scholarship(id, details).await?))
}

/// DELETE /scholarships/{id}
#[instrument(skip(state, _guard))]
pub async fn delete_scholarship(
    State(state): State<AppState>,
    _guard: Guarded<Admin>,
    ApiPath(id): ApiPath<DocumentId>,
) -> ApiResult<Json<DeletedResponse>> {
    state.store.delete_scholarship(id).await?;
    info!("Scholarship {} deleted", id);
    Ok(DeletedResponse::one())
}
