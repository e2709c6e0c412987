//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use forkd_common::AppError;
use forkd_db::entities::admin_session;

/// Authenticated admin extractor.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub admin_session::Model);

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<admin_session::Model>()
            .cloned()
            .map(AdminAuth)
            .ok_or(AppError::Unauthorized)
    }
}
