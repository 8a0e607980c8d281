use crate::auth::{Caller, Guarded, Moderator};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use scholar_core::{Application, DocumentId, StatusUpdate};
use tracing::{info, instrument};

/// GET /my-applications
pub async fn my_applications(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<Application>>> {
    Ok(Json(
        state.store.applications_for_student(caller.email()).await?,
    ))
}

/// GET /applications
pub async fn list_applications(
    State(state): State<AppState>,
    _guard: Guarded<Moderator>,
) -> ApiResult<Json<Vec<Application>>> {
    Ok(Json(state.store.all_applications().await?))
}

/// PATCH /applications/status/{id}
#[instrument(skip(state, guard, update), fields(moderator = %guard.caller.email(), status = %update.status))]
pub async fn update_status(
    State(state): State<AppState>,
    guard: Guarded<Moderator>,
    ApiPath(id): ApiPath<DocumentId>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> ApiResult<Json<Application>> {
    let application = state.store.update_application_status(id, &update).await?;
    info!("Application {} set to {}", id, application.status);
    Ok(Json(application))
}
