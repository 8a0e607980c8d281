//! # Caller Authentication
//!
//! `Caller` verifies the bearer token. `Guarded<R>` additionally loads the
//! caller's account and runs [`authorize`] for the role `R` names. Both run
//! before the request body is read, so a rejected request never reaches the
//! store operation behind the route.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use scholar_core::{authorize, bearer_token, AccessDenied, AuthError, Role, User, VerifiedIdentity};
use std::marker::PhantomData;
use tracing::debug;

/// An authenticated caller
#[derive(Debug, Clone)]
pub struct Caller(pub VerifiedIdentity);

impl Caller {
    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = bearer_token(header)?;
        let identity = state.verifier.verify(token).await.map_err(|e| {
            debug!("Token rejected: {}", e);
            e
        })?;

        Ok(Caller(identity))
    }
}

/// Marker for the role a route requires
pub trait RequiredRole: Send + Sync + 'static {
    const ROLE: Role;
}

pub struct Admin;

impl RequiredRole for Admin {
    const ROLE: Role = Role::Admin;
}

pub struct Moderator;

impl RequiredRole for Moderator {
    const ROLE: Role = Role::Moderator;
}

/// A caller whose stored account holds role `R`
pub struct Guarded<R: RequiredRole> {
    pub caller: Caller,
    pub user: User,
    _role: PhantomData<R>,
}

impl<R: RequiredRole> FromRequestParts<AppState> for Guarded<R> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        let user = state.store.find_user_by_email(caller.email()).await?;

        authorize(user.as_ref(), R::ROLE)?;
        let user = user.ok_or(AccessDenied {
            required: R::ROLE,
            actual: None,
        })?;

        Ok(Guarded {
            caller,
            user,
            _role: PhantomData,
        })
    }
}
