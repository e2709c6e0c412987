//! Subject moderation endpoints, one set per role.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use chrono::{DateTime, FixedOffset, Utc};
use forkd_common::AppResult;
use forkd_core::{ModerationService, SubjectFilter, SubjectView};
use forkd_db::entities::{
    audit_record,
    subject::{self, LifecycleState, SubjectRole},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::AdminAuth,
    middleware::AppState,
    response::{ApiResponse, ItemResult, bulk_results},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{role}/list", post(list))
        .route("/{role}/approve", post(approve))
        .route("/{role}/reject", post(reject))
        .route("/{role}/suspend", post(suspend))
        .route("/{role}/ban", post(ban))
        .route("/{role}/reactivate", post(reactivate))
        .route("/{role}/return", post(return_to_pending))
        .route("/{role}/history", post(history))
        .route("/{role}/sweep-expired", post(sweep_expired))
}

fn engine<'a>(state: &'a AppState, role: &str) -> AppResult<&'a ModerationService> {
    let role: SubjectRole = role.parse()?;
    Ok(state.moderation.for_role(role))
}

/// Rider coordinates.
#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub lat: f64,
    pub lng: f64,
}

/// Subject response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResponse {
    pub id: String,
    pub role: SubjectRole,
    pub name: String,
    pub username: Option<String>,
    pub state: LifecycleState,
    pub state_label: &'static str,
    pub reason: Option<String>,
    pub suspension_until: Option<DateTime<FixedOffset>>,
    pub suspension_expired: bool,
    pub is_verified: bool,
    pub is_active: bool,
    pub documents: Option<serde_json::Value>,
    pub location: Option<LocationResponse>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl From<SubjectView> for SubjectResponse {
    fn from(view: SubjectView) -> Self {
        let location = view
            .subject
            .location()
            .map(|(lat, lng)| LocationResponse { lat, lng });
        let subject = view.subject;
        Self {
            id: subject.id,
            role: subject.role,
            name: subject.name,
            username: subject.username,
            state: view.state,
            state_label: view.state_label,
            reason: view.reason,
            suspension_until: subject.suspension_until,
            suspension_expired: view.suspension_expired,
            is_verified: subject.is_verified,
            is_active: subject.is_active,
            documents: subject.documents,
            location,
            created_at: subject.created_at,
            updated_at: subject.updated_at,
        }
    }
}

fn subject_response(subject: subject::Model) -> AppResult<SubjectResponse> {
    SubjectView::load(subject, Utc::now()).map(SubjectResponse::from)
}

/// Audit record response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecordResponse {
    pub id: String,
    pub subject_id: String,
    pub action: String,
    pub reason: String,
    pub duration_days: Option<i32>,
    pub actor: Option<String>,
    pub timestamp: DateTime<FixedOffset>,
}

impl From<audit_record::Model> for AuditRecordResponse {
    fn from(record: audit_record::Model) -> Self {
        Self {
            id: record.id,
            subject_id: record.subject_id,
            action: record.action,
            reason: record.reason,
            duration_days: record.duration_days,
            actor: record.actor,
            timestamp: record.timestamp,
        }
    }
}

/// List subjects request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSubjectsRequest {
    /// Lifecycle state; legacy spellings such as `denied` are accepted.
    pub state: Option<String>,
    pub search: Option<String>,
}

/// Subject selection request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    #[validate(length(min = 1, max = 500))]
    pub ids: Vec<String>,
}

/// Reject request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    #[validate(length(min = 1, max = 500))]
    pub ids: Vec<String>,
    #[validate(length(max = 2000))]
    pub reason: String,
}

/// Suspend request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SuspendRequest {
    pub subject_id: String,
    #[validate(length(max = 2000))]
    pub reason: String,
    #[validate(range(min = 1, max = 3650))]
    pub days: i32,
}

/// Ban request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BanRequest {
    pub subject_id: String,
    #[validate(length(max = 2000))]
    pub reason: String,
}

/// Single subject request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectIdRequest {
    pub subject_id: String,
}

/// History request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub subject_id: Option<String>,
}

/// List subjects of a role.
async fn list(
    AdminAuth(_session): AdminAuth,
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(req): Json<ListSubjectsRequest>,
) -> AppResult<ApiResponse<Vec<SubjectResponse>>> {
    let engine = engine(&state, &role)?;
    let filter = SubjectFilter {
        state: req
            .state
            .as_deref()
            .map(str::parse::<LifecycleState>)
            .transpose()?,
        search: req.search,
    };

    let subjects = engine.list_subjects(&filter).await?;
    Ok(ApiResponse::ok(
        subjects.into_iter().map(SubjectResponse::from).collect(),
    ))
}

/// Approve pending subjects.
async fn approve(
    AdminAuth(session): AdminAuth,
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(req): Json<SelectionRequest>,
) -> AppResult<ApiResponse<Vec<ItemResult<SubjectResponse>>>> {
    req.validate()?;
    let outcome = engine(&state, &role)?.approve(&session, &req.ids).await?;
    Ok(ApiResponse::ok(bulk_results(outcome, subject_response)))
}

/// Reject pending subjects.
async fn reject(
    AdminAuth(session): AdminAuth,
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(req): Json<RejectRequest>,
) -> AppResult<ApiResponse<Vec<ItemResult<SubjectResponse>>>> {
    req.validate()?;
    let outcome = engine(&state, &role)?
        .reject(&session, &req.ids, &req.reason)
        .await?;
    Ok(ApiResponse::ok(bulk_results(outcome, subject_response)))
}

/// Suspend an approved subject.
async fn suspend(
    AdminAuth(session): AdminAuth,
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(req): Json<SuspendRequest>,
) -> AppResult<ApiResponse<SubjectResponse>> {
    req.validate()?;
    let subject = engine(&state, &role)?
        .suspend(&session, &req.subject_id, &req.reason, req.days)
        .await?;
    Ok(ApiResponse::ok(subject_response(subject)?))
}

/// Ban a subject.
async fn ban(
    AdminAuth(session): AdminAuth,
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(req): Json<BanRequest>,
) -> AppResult<ApiResponse<SubjectResponse>> {
    req.validate()?;
    let subject = engine(&state, &role)?
        .ban(&session, &req.subject_id, &req.reason)
        .await?;
    Ok(ApiResponse::ok(subject_response(subject)?))
}

/// Lift a suspension or ban.
async fn reactivate(
    AdminAuth(session): AdminAuth,
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(req): Json<SubjectIdRequest>,
) -> AppResult<ApiResponse<SubjectResponse>> {
    let subject = engine(&state, &role)?
        .reactivate(&session, &req.subject_id)
        .await?;
    Ok(ApiResponse::ok(subject_response(subject)?))
}

/// Send a subject back to the request queue.
async fn return_to_pending(
    AdminAuth(session): AdminAuth,
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(req): Json<SubjectIdRequest>,
) -> AppResult<ApiResponse<SubjectResponse>> {
    let subject = engine(&state, &role)?
        .return_to_pending(&session, &req.subject_id)
        .await?;
    Ok(ApiResponse::ok(subject_response(subject)?))
}

/// Moderation history for a role or one subject.
async fn history(
    AdminAuth(_session): AdminAuth,
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(req): Json<HistoryRequest>,
) -> AppResult<ApiResponse<Vec<AuditRecordResponse>>> {
    let records = engine(&state, &role)?
        .history(req.subject_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(
        records.into_iter().map(AuditRecordResponse::from).collect(),
    ))
}

/// Reactivate subjects whose suspension has run out.
async fn sweep_expired(
    AdminAuth(session): AdminAuth,
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> AppResult<ApiResponse<Vec<ItemResult<SubjectResponse>>>> {
    let outcome = engine(&state, &role)?
        .sweep_expired_suspensions(&session)
        .await?;
    Ok(ApiResponse::ok(bulk_results(outcome, subject_response)))
}
