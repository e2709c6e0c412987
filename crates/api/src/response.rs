//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use forkd_common::{AppError, AppResult};
use forkd_core::BulkOutcome;
use serde::Serialize;

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = if self.error.is_some() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::OK
        };
        (status, Json(self)).into_response()
    }
}

/// Outcome of one item in a bulk request.
#[derive(Debug, Serialize)]
pub struct ItemResult<T: Serialize> {
    pub id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T: Serialize> ItemResult<T> {
    /// Build from an item id and its result.
    pub fn new(id: impl Into<String>, result: AppResult<T>) -> Self {
        match result {
            Ok(data) => Self {
                id: id.into(),
                ok: true,
                data: Some(data),
                error: None,
            },
            Err(e) => Self {
                id: id.into(),
                ok: false,
                data: None,
                error: Some(ApiError::from(&e)),
            },
        }
    }
}

/// Convert per-item outcomes, mapping each success through `f`.
pub fn bulk_results<T, R, F>(outcome: BulkOutcome<T>, f: F) -> Vec<ItemResult<R>>
where
    R: Serialize,
    F: Fn(T) -> AppResult<R>,
{
    outcome
        .items
        .into_iter()
        .map(|item| ItemResult::new(item.id, item.result.and_then(&f)))
        .collect()
}

/// Empty success response.
#[must_use]
pub fn ok() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
