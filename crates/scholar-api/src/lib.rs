//! # scholar-api
//!
//! HTTP API layer for scholarstream.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Bearer-token authentication and role-guard extractors
//! - REST endpoints for scholarships, applications, reviews, users,
//!   checkout and analytics
//!
//! ## Endpoints (selection)
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | GET | `/health` | public |
//! | GET | `/allscholarships` | public |
//! | POST | `/scholarships` | Admin |
//! | PATCH | `/applications/status/{id}` | Moderator |
//! | POST | `/create-checkout-session` | signed in |
//! | POST | `/payment-success` | signed in |

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppConfig, AppState};
