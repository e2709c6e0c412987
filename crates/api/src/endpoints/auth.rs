//! Authentication endpoints.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use chrono::{DateTime, FixedOffset};
use forkd_common::AppResult;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::AdminAuth,
    middleware::AppState,
    response::{self, ApiResponse},
};

/// Signin request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// Signin response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<FixedOffset>,
}

/// Sign in to the admin console.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<SigninResponse>> {
    req.validate()?;

    let session = state
        .auth_service
        .login(&req.username, &req.password)
        .await?;

    Ok(ApiResponse::ok(SigninResponse {
        token: session.token,
        username: session.username,
        expires_at: session.expires_at,
    }))
}

/// End the current session.
async fn signout(
    AdminAuth(session): AdminAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    state.auth_service.logout(&session.token).await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signin", post(signin))
        .route("/signout", post(signout))
}
