//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use wastewatch_common::AppError;
use wastewatch_db::entities::user;

/// Authenticated user extractor.
///
/// The auth middleware resolves the Bearer token and stores the user model
/// in request extensions; this extractor rejects with 401 when it is absent.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}
