use super::DeletedResponse;
use crate::auth::{Admin, Caller, Guarded};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use scholar_core::{DocumentId, LoginProfile, Role, User};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// True when this login created the account
    pub inserted: bool,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: Role,
}

/// POST /users: record a login for the caller's email
#[instrument(skip(state, caller, profile), fields(email = %caller.email()))]
pub async fn login(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(mut profile): ApiJson<LoginProfile>,
) -> ApiResult<Json<LoginResponse>> {
    if profile.name.trim().is_empty() {
        if let Some(name) = caller.name() {
            profile.name = name.to_string();
        }
    }

    let outcome = state
        .store
        .record_login(caller.email(), profile, Utc::now())
        .await?;

    let inserted = outcome.is_new();
    if inserted {
        info!("New student account");
    }

    Ok(Json(LoginResponse {
        inserted,
        user: outcome.user().clone(),
    }))
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    _guard: Guarded<Admin>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.store.all_users().await?))
}

/// GET /user/role
pub async fn user_role(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<RoleResponse>> {
    let user = state.store.find_user_by_email(caller.email()).await?;
    Ok(Json(RoleResponse {
        role: user.map(|u| u.role),
    }))
}

/// PATCH /users/{id}/role
#[instrument(skip(state, guard, change), fields(admin = %guard.caller.email(), role = %change.role))]
pub async fn update_role(
    State(state): State<AppState>,
    guard: Guarded<Admin>,
    ApiPath(id): ApiPath<DocumentId>,
    ApiJson(change): ApiJson<RoleChange>,
) -> ApiResult<Json<User>> {
    let user = state.store.update_user_role(id, change.role).await?;
    info!("User {} is now {}", user.email, user.role);
    Ok(Json(user))
}

/// DELETE /users/{id}
#[instrument(skip(state, guard), fields(admin = %guard.caller.email()))]
pub async fn delete_user(
    State(state): State<AppState>,
    guard: Guarded<Admin>,
    ApiPath(id): ApiPath<DocumentId>,
) -> ApiResult<Json<DeletedResponse>> {
    state.store.delete_user(id).await?;
    info!("User {} deleted", id);
    Ok(DeletedResponse::one())
}
