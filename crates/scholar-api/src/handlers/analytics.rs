//! Admin dashboard figures, all computed by the store.

use crate::auth::{Admin, Guarded};
use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use scholar_core::UniversityCount;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalUsers {
    pub total_users: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalScholarships {
    pub total_scholarships: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalFees {
    pub total_fees: f64,
}

/// GET /analytics/total-users
pub async fn total_users(
    State(state): State<AppState>,
    _guard: Guarded<Admin>,
) -> ApiResult<Json<TotalUsers>> {
    Ok(Json(TotalUsers {
        total_users: state.store.count_users().await?,
    }))
}

/// GET /analytics/total-scholarships
pub async fn total_scholarships(
    State(state): State<AppState>,
    _guard: Guarded<Admin>,
) -> ApiResult<Json<TotalScholarships>> {
    Ok(Json(TotalScholarships {
        total_scholarships: state.store.count_scholarships().await?,
    }))
}

/// GET /analytics/total-fees
pub async fn total_fees(
    State(state): State<AppState>,
    _guard: Guarded<Admin>,
) -> ApiResult<Json<TotalFees>> {
    Ok(Json(TotalFees {
        total_fees: state.store.total_application_fees().await?,
    }))
}

/// GET /analytics/applications-chart
pub async fn applications_chart(
    State(state): State<AppState>,
    _guard: Guarded<Admin>,
) -> ApiResult<Json<Vec<UniversityCount>>> {
    Ok(Json(state.store.applications_per_university().await?))
}
