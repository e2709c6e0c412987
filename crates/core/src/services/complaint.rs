//! Complaint resolution.

use chrono::Utc;
use forkd_common::{AppError, AppResult};
use forkd_db::{
    entities::{
        admin_session,
        complaint_ticket::{self, TicketStatus, Verdict},
        subject::{self, SubjectRole},
    },
    repositories::ComplaintRepository,
};
use sea_orm::Set;

use super::{
    bulk::{BulkOutcome, normalize_selection},
    moderation::{ModerationAction, ModerationEngines},
};

/// Listing filter for complaint tickets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicketFilter {
    /// Role of the accused.
    pub category: Option<SubjectRole>,
    pub status: Option<TicketStatus>,
}

impl TicketFilter {
    #[must_use]
    pub fn matches(&self, ticket: &complaint_ticket::Model) -> bool {
        self.category.is_none_or(|c| ticket.category == c)
            && self.status.is_none_or(|s| ticket.status == s)
    }
}

/// Moderation action against the accused, applied after a ticket is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Escalation {
    Suspend { reason: String, days: i32 },
    Ban { reason: String },
}

impl From<Escalation> for ModerationAction {
    fn from(escalation: Escalation) -> Self {
        match escalation {
            Escalation::Suspend { reason, days } => Self::Suspend { reason, days },
            Escalation::Ban { reason } => Self::Ban { reason },
        }
    }
}

/// A resolved ticket and, when requested, what happened to the accused.
#[derive(Debug)]
pub struct ResolveOutcome {
    pub ticket: complaint_ticket::Model,
    pub escalation: Option<AppResult<subject::Model>>,
}

/// Complaint resolution service.
#[derive(Clone)]
pub struct ComplaintService {
    complaint_repo: ComplaintRepository,
    moderation: ModerationEngines,
}

impl ComplaintService {
    /// Create a new complaint service.
    #[must_use]
    pub const fn new(complaint_repo: ComplaintRepository, moderation: ModerationEngines) -> Self {
        Self {
            complaint_repo,
            moderation,
        }
    }

    /// List tickets, newest first.
    pub async fn list_tickets(
        &self,
        filter: TicketFilter,
    ) -> AppResult<Vec<complaint_ticket::Model>> {
        let tickets = self
            .complaint_repo
            .list(filter.category, filter.status)
            .await?;
        Ok(tickets.into_iter().filter(|t| filter.matches(t)).collect())
    }

    /// Get a ticket by ID.
    pub async fn get_ticket(&self, id: &str) -> AppResult<complaint_ticket::Model> {
        self.complaint_repo.get_by_id(id).await
    }

    /// Resolve a ticket in the complainant's favour.
    ///
    /// An escalation is validated up front but only applied once the ticket
    /// write has succeeded. Its failure does not undo the resolution.
    pub async fn resolve(
        &self,
        session: &admin_session::Model,
        id: &str,
        response: &str,
        escalation: Option<Escalation>,
    ) -> AppResult<ResolveOutcome> {
        let action = escalation
            .map(|e| ModerationAction::from(e).validated())
            .transpose()?;

        let ticket = self.close(session, id, Verdict::Resolved, response).await?;

        let escalation = match action {
            Some(action) => {
                let engine = self.moderation.for_role(ticket.category);
                let result = engine.apply(session, &ticket.accused_id, action).await;
                if let Err(e) = &result {
                    tracing::warn!(
                        ticket_id = %ticket.id,
                        subject_id = %ticket.accused_id,
                        error = %e,
                        "Escalation against accused failed"
                    );
                }
                Some(result)
            }
            None => None,
        };

        Ok(ResolveOutcome { ticket, escalation })
    }

    /// Close a ticket without upholding it.
    pub async fn dismiss(
        &self,
        session: &admin_session::Model,
        id: &str,
        response: &str,
    ) -> AppResult<complaint_ticket::Model> {
        self.close(session, id, Verdict::Dismissed, response).await
    }

    /// Close several tickets with the same verdict and response.
    pub async fn bulk_resolve(
        &self,
        session: &admin_session::Model,
        ids: &[String],
        verdict: Verdict,
        response: &str,
    ) -> AppResult<BulkOutcome<complaint_ticket::Model>> {
        let response = required_response(response)?;
        let selection = normalize_selection(ids, "tickets")?;

        let mut outcome = BulkOutcome::new();
        for id in selection {
            let result = self.close(session, &id, verdict, response).await;
            outcome.push(id, result);
        }
        Ok(outcome)
    }

    async fn close(
        &self,
        session: &admin_session::Model,
        id: &str,
        verdict: Verdict,
        response: &str,
    ) -> AppResult<complaint_ticket::Model> {
        let response = required_response(response)?;
        let ticket = self.complaint_repo.get_by_id(id).await?;

        if ticket.status == TicketStatus::Resolved {
            return Err(AppError::validation(format!(
                "Complaint {id} is already resolved"
            )));
        }

        let mut active: complaint_ticket::ActiveModel = ticket.into();
        active.status = Set(TicketStatus::Resolved);
        active.verdict = Set(Some(verdict));
        active.admin_response = Set(Some(response.to_string()));
        active.resolved_by = Set(Some(session.username.clone()));
        active.resolved_at = Set(Some(Utc::now().into()));

        let ticket = self.complaint_repo.update(active).await?;

        tracing::info!(
            ticket_id = %ticket.id,
            verdict = verdict.label(),
            actor = %session.username,
            "Complaint closed"
        );
        Ok(ticket)
    }
}

fn required_response(response: &str) -> AppResult<&str> {
    let response = response.trim();
    if response.is_empty() {
        return Err(AppError::validation("Response is required"));
    }
    Ok(response)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use forkd_db::{
        entities::{audit_record, subject::LifecycleState},
        repositories::{AuditRecordRepository, SubjectRepository},
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn session() -> admin_session::Model {
        let now = Utc::now();
        admin_session::Model {
            token: "tok".to_string(),
            username: "ops-admin".to_string(),
            created_at: now.into(),
            expires_at: (now + Duration::hours(12)).into(),
        }
    }

    fn create_test_ticket(id: &str, status: TicketStatus) -> complaint_ticket::Model {
        complaint_ticket::Model {
            id: id.to_string(),
            complainant_id: "u1".to_string(),
            accused_id: "c1".to_string(),
            category: SubjectRole::Chef,
            narrative: "Food arrived cold".to_string(),
            service_observation: "Packaging was open".to_string(),
            proof_reference: Some("proofs/t1.jpg".to_string()),
            status,
            verdict: None,
            admin_response: None,
            resolved_by: None,
            created_at: Utc::now().into(),
            resolved_at: None,
        }
    }

    fn closed(mut ticket: complaint_ticket::Model, verdict: Verdict) -> complaint_ticket::Model {
        ticket.status = TicketStatus::Resolved;
        ticket.verdict = Some(verdict);
        ticket.admin_response = Some("reviewed".to_string());
        ticket.resolved_by = Some("ops-admin".to_string());
        ticket.resolved_at = Some(Utc::now().into());
        ticket
    }

    fn chef(state: &str) -> subject::Model {
        subject::Model {
            id: "c1".to_string(),
            role: SubjectRole::Chef,
            name: "Meera Nair".to_string(),
            username: None,
            lifecycle_state: Some(state.to_string()),
            is_verified: state == "approved",
            is_active: state == "approved",
            rejection_reason: None,
            suspension_reason: None,
            suspension_until: None,
            ban_reason: None,
            documents: None,
            location_lat: None,
            location_lng: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_service(db: &Arc<DatabaseConnection>) -> ComplaintService {
        let engines = ModerationEngines::new(
            &SubjectRepository::new(db.clone()),
            &AuditRecordRepository::new(db.clone()),
        );
        ComplaintService::new(ComplaintRepository::new(db.clone()), engines)
    }

    fn transaction_log(db: Arc<DatabaseConnection>) -> String {
        format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log())
    }

    #[test]
    fn test_filter_is_a_pure_predicate() {
        let ticket = create_test_ticket("t1", TicketStatus::Pending);
        let chef_pending = TicketFilter {
            category: Some(SubjectRole::Chef),
            status: Some(TicketStatus::Pending),
        };
        let riders = TicketFilter {
            category: Some(SubjectRole::Rider),
            status: None,
        };

        assert!(TicketFilter::default().matches(&ticket));
        assert!(chef_pending.matches(&ticket));
        assert!(!riders.matches(&ticket));
    }

    #[tokio::test]
    async fn test_dismiss_sets_verdict() {
        let ticket = create_test_ticket("t1", TicketStatus::Pending);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[ticket.clone()]])
                .append_query_results([[closed(ticket, Verdict::Dismissed)]])
                .into_connection(),
        );
        let service = create_test_service(&db);

        let ticket = service.dismiss(&session(), "t1", " reviewed ").await.unwrap();
        assert_eq!(ticket.status, TicketStatus::Resolved);
        assert_eq!(ticket.verdict, Some(Verdict::Dismissed));

        drop(service);
        let log = transaction_log(db);
        assert!(log.contains("\"reviewed\""));
    }

    #[tokio::test]
    async fn test_blank_response_writes_nothing() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(&db);

        let err = service.resolve(&session(), "t1", "   ", None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        drop(service);
        assert_eq!(transaction_log(db), "[]");
    }

    #[tokio::test]
    async fn test_already_resolved_ticket_is_rejected_without_write() {
        let ticket = closed(create_test_ticket("t1", TicketStatus::Pending), Verdict::Resolved);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[ticket]])
                .into_connection(),
        );
        let service = create_test_service(&db);

        let err = service
            .resolve(&session(), "t1", "again", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("already resolved")));

        drop(service);
        let log = transaction_log(db);
        assert!(!log.contains("UPDATE"));
    }

    #[tokio::test]
    async fn test_bulk_resolve_reports_missing_ticket_without_blocking() {
        let t1 = create_test_ticket("t1", TicketStatus::Pending);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[t1.clone()]])
                .append_query_results([[closed(t1, Verdict::Dismissed)]])
                .append_query_results([Vec::<complaint_ticket::Model>::new()])
                .into_connection(),
        );
        let service = create_test_service(&db);

        let ids = vec!["t1".to_string(), "t2".to_string()];
        let outcome = service
            .bulk_resolve(&session(), &ids, Verdict::Dismissed, "reviewed")
            .await
            .unwrap();

        let t1 = outcome.items[0].result.as_ref().unwrap();
        assert_eq!(t1.status, TicketStatus::Resolved);
        assert_eq!(t1.verdict, Some(Verdict::Dismissed));
        assert_eq!(outcome.items[1].id, "t2");
        assert!(matches!(outcome.items[1].result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_resolve_with_suspension_escalates_accused() {
        let ticket = create_test_ticket("t1", TicketStatus::Pending);
        let mut suspended = chef("suspended");
        suspended.suspension_reason = Some("hygiene".to_string());
        suspended.suspension_until = Some((Utc::now() + Duration::days(3)).into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[ticket.clone()]])
                .append_query_results([[closed(ticket, Verdict::Resolved)]])
                .append_query_results([[chef("approved")]])
                .append_query_results([[suspended]])
                .append_query_results([[audit_record::Model {
                    id: "a1".to_string(),
                    subject_id: "c1".to_string(),
                    role: SubjectRole::Chef,
                    action: "Suspended 3d".to_string(),
                    reason: "hygiene".to_string(),
                    duration_days: Some(3),
                    actor: Some("ops-admin".to_string()),
                    timestamp: Utc::now().into(),
                }]])
                .into_connection(),
        );
        let service = create_test_service(&db);

        let escalation = Escalation::Suspend {
            reason: "hygiene".to_string(),
            days: 3,
        };
        let outcome = service
            .resolve(&session(), "t1", "upheld", Some(escalation))
            .await
            .unwrap();

        assert_eq!(outcome.ticket.verdict, Some(Verdict::Resolved));
        let accused = outcome.escalation.unwrap().unwrap();
        assert_eq!(accused.state().unwrap(), LifecycleState::Suspended);
    }

    #[tokio::test]
    async fn test_invalid_escalation_is_rejected_before_ticket_write() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(&db);

        let escalation = Escalation::Ban {
            reason: " ".to_string(),
        };
        let err = service
            .resolve(&session(), "t1", "upheld", Some(escalation))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        drop(service);
        assert_eq!(transaction_log(db), "[]");
    }
}
