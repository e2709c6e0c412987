//! Complaint endpoints.

use axum::{Json, Router, extract::State, routing::post};
use chrono::{DateTime, FixedOffset, Utc};
use forkd_common::AppResult;
use forkd_core::{Escalation, SubjectView, TicketFilter};
use forkd_db::entities::{
    complaint_ticket::{self, TicketStatus, Verdict},
    subject::SubjectRole,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::subjects::SubjectResponse;
use crate::{
    extractors::AdminAuth,
    middleware::AppState,
    response::{ApiResponse, ItemResult, bulk_results},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/show", post(show))
        .route("/resolve", post(resolve))
        .route("/dismiss", post(dismiss))
        .route("/bulk-resolve", post(bulk_resolve))
}

/// Complaint ticket response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: String,
    pub complainant_id: String,
    pub accused_id: String,
    pub category: SubjectRole,
    pub narrative: String,
    pub service_observation: String,
    pub proof_reference: Option<String>,
    pub status: TicketStatus,
    pub verdict: Option<Verdict>,
    pub verdict_label: Option<&'static str>,
    pub admin_response: Option<String>,
    pub resolved_by: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub resolved_at: Option<DateTime<FixedOffset>>,
}

impl From<complaint_ticket::Model> for TicketResponse {
    fn from(ticket: complaint_ticket::Model) -> Self {
        Self {
            id: ticket.id,
            complainant_id: ticket.complainant_id,
            accused_id: ticket.accused_id,
            category: ticket.category,
            narrative: ticket.narrative,
            service_observation: ticket.service_observation,
            proof_reference: ticket.proof_reference,
            status: ticket.status,
            verdict: ticket.verdict,
            verdict_label: ticket.verdict.map(Verdict::label),
            admin_response: ticket.admin_response,
            resolved_by: ticket.resolved_by,
            created_at: ticket.created_at,
            resolved_at: ticket.resolved_at,
        }
    }
}

/// List tickets request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTicketsRequest {
    /// Role of the accused: chefs, riders or users.
    pub category: Option<String>,
    pub status: Option<TicketStatus>,
}

/// Single ticket request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketIdRequest {
    pub ticket_id: String,
}

/// Action taken against the accused when a complaint is upheld.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum EscalationRequest {
    Suspend { reason: String, days: i32 },
    Ban { reason: String },
}

impl From<EscalationRequest> for Escalation {
    fn from(req: EscalationRequest) -> Self {
        match req {
            EscalationRequest::Suspend { reason, days } => Self::Suspend { reason, days },
            EscalationRequest::Ban { reason } => Self::Ban { reason },
        }
    }
}

/// Resolve request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub ticket_id: String,
    #[validate(length(max = 4000))]
    pub response: String,
    pub escalation: Option<EscalationRequest>,
}

/// Dismiss request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DismissRequest {
    pub ticket_id: String,
    #[validate(length(max = 4000))]
    pub response: String,
}

/// Bulk resolve request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkResolveRequest {
    #[validate(length(min = 1, max = 500))]
    pub ticket_ids: Vec<String>,
    pub verdict: Verdict,
    #[validate(length(max = 4000))]
    pub response: String,
}

/// Resolve response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub ticket: TicketResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation: Option<ItemResult<SubjectResponse>>,
}

/// List tickets.
async fn list(
    AdminAuth(_session): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<ListTicketsRequest>,
) -> AppResult<ApiResponse<Vec<TicketResponse>>> {
    let filter = TicketFilter {
        category: req
            .category
            .as_deref()
            .map(str::parse::<SubjectRole>)
            .transpose()?,
        status: req.status,
    };

    let tickets = state.complaint_service.list_tickets(filter).await?;
    Ok(ApiResponse::ok(
        tickets.into_iter().map(TicketResponse::from).collect(),
    ))
}

/// Show one ticket.
async fn show(
    AdminAuth(_session): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<TicketIdRequest>,
) -> AppResult<ApiResponse<TicketResponse>> {
    let ticket = state.complaint_service.get_ticket(&req.ticket_id).await?;
    Ok(ApiResponse::ok(ticket.into()))
}

/// Resolve a ticket, optionally acting on the accused.
async fn resolve(
    AdminAuth(session): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> AppResult<ApiResponse<ResolveResponse>> {
    req.validate()?;

    let outcome = state
        .complaint_service
        .resolve(
            &session,
            &req.ticket_id,
            &req.response,
            req.escalation.map(Escalation::from),
        )
        .await?;

    let accused_id = outcome.ticket.accused_id.clone();
    let escalation = outcome.escalation.map(|result| {
        let result =
            result.and_then(|s| SubjectView::load(s, Utc::now()).map(SubjectResponse::from));
        ItemResult::new(accused_id, result)
    });

    Ok(ApiResponse::ok(ResolveResponse {
        ticket: outcome.ticket.into(),
        escalation,
    }))
}

/// Dismiss a ticket.
async fn dismiss(
    AdminAuth(session): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<DismissRequest>,
) -> AppResult<ApiResponse<TicketResponse>> {
    req.validate()?;
    let ticket = state
        .complaint_service
        .dismiss(&session, &req.ticket_id, &req.response)
        .await?;
    Ok(ApiResponse::ok(ticket.into()))
}

/// Close several tickets with one verdict.
async fn bulk_resolve(
    AdminAuth(session): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<BulkResolveRequest>,
) -> AppResult<ApiResponse<Vec<ItemResult<TicketResponse>>>> {
    req.validate()?;
    let outcome = state
        .complaint_service
        .bulk_resolve(&session, &req.ticket_ids, req.verdict, &req.response)
        .await?;
    Ok(ApiResponse::ok(bulk_results(outcome, |t| Ok(t.into()))))
}
