//! # Request Handlers
//!
//! Thin axum handlers: authenticate, optionally guard a role, call one store
//! or orchestrator operation, serialize the result.

pub mod analytics;
pub mod applications;
pub mod payments;
pub mod reviews;
pub mod scholarships;
pub mod users;

use axum::response::IntoResponse;
use axum::Json;
use scholar_core::DocumentId;
use serde::Serialize;

/// Response of insert endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedResponse {
    pub inserted_id: DocumentId,
}

/// Response of delete endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub deleted_count: u64,
}

impl DeletedResponse {
    pub fn one() -> Json<Self> {
        Json(Self { deleted_count: 1 })
    }
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "scholarstream",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
