//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use govboard_common::AppError;
use govboard_core::AccessScope;
use govboard_db::entities::user;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl AuthUser {
    /// Access scope of this caller.
    #[must_use]
    pub fn scope(&self) -> AccessScope {
        AccessScope::for_user(&self.0)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the auth middleware
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}
