//! API endpoints.

#![allow(missing_docs)]

pub mod auth;
pub mod complaints;
pub mod delivery;
pub mod subjects;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/subjects", subjects::router())
        .nest("/complaints", complaints::router())
        .nest("/delivery", delivery::router())
}
