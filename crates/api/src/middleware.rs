//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use forkd_core::{AssignmentService, AuthService, ComplaintService, ModerationEngines};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub moderation: ModerationEngines,
    pub complaint_service: ComplaintService,
    pub assignment_service: AssignmentService,
    pub auth_service: AuthService,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to an admin session and stores it
/// in the request extensions. Requests without a live session pass through
/// unauthenticated; handlers that need one reject them.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.auth_service.authenticate(token.trim()).await {
            Ok(session) => {
                req.extensions_mut().insert(session);
            }
            Err(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Session lookup failed");
            }
            Err(_) => {}
        }
    }

    next.run(req).await
}
