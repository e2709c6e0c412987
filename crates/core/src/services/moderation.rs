//! Moderation engine for chef, rider and user accounts.
//!
//! Every transition is one subject update followed by one audit record
//! insert. The two writes are not linked by a transaction: the audit insert
//! is attempted even when the subject update fails, and a failure in either
//! is reported distinctly.

use chrono::{DateTime, Duration, Utc};
use forkd_common::{AppError, AppResult, IdGenerator};
use forkd_db::{
    entities::{
        admin_session, audit_record,
        subject::{self, LifecycleState, SubjectRole},
    },
    repositories::{AuditRecordRepository, SubjectRepository},
};
use sea_orm::Set;

use super::bulk::{BulkOutcome, normalize_selection};

/// Default page size for audit history.
const HISTORY_LIMIT: u64 = 200;

/// A requested lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationAction {
    Approve,
    Reject { reason: String },
    Suspend { reason: String, days: i32 },
    Ban { reason: String },
    Reactivate,
    ReturnToPending,
}

impl ModerationAction {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject { .. } => "reject",
            Self::Suspend { .. } => "suspend",
            Self::Ban { .. } => "ban",
            Self::Reactivate => "reactivate",
            Self::ReturnToPending => "return",
        }
    }

    /// Trim the reason and check the guards that need no stored state.
    ///
    /// Destructive actions need a non-blank reason and suspensions need a
    /// positive day count.
    pub fn validated(self) -> AppResult<Self> {
        fn required(reason: &str) -> AppResult<String> {
            let reason = reason.trim();
            if reason.is_empty() {
                return Err(AppError::validation("Reason is required"));
            }
            Ok(reason.to_string())
        }

        match self {
            Self::Reject { reason } => Ok(Self::Reject {
                reason: required(&reason)?,
            }),
            Self::Suspend { reason, days } => {
                if days < 1 {
                    return Err(AppError::validation(
                        "Suspension must last at least one day",
                    ));
                }
                Ok(Self::Suspend {
                    reason: required(&reason)?,
                    days,
                })
            }
            Self::Ban { reason } => Ok(Self::Ban {
                reason: required(&reason)?,
            }),
            action => Ok(action),
        }
    }

    /// Target state of the transition.
    #[must_use]
    pub const fn target(&self) -> LifecycleState {
        match self {
            Self::Approve | Self::Reactivate => LifecycleState::Approved,
            Self::Reject { .. } => LifecycleState::Rejected,
            Self::Suspend { .. } => LifecycleState::Suspended,
            Self::Ban { .. } => LifecycleState::Banned,
            Self::ReturnToPending => LifecycleState::Pending,
        }
    }

    const fn allowed_from(&self) -> &'static [LifecycleState] {
        use LifecycleState::{Approved, Banned, Pending, Rejected, Suspended};
        match self {
            Self::Approve | Self::Reject { .. } => &[Pending],
            Self::Suspend { .. } => &[Approved],
            Self::Ban { .. } => &[Approved, Suspended],
            Self::Reactivate => &[Suspended, Banned],
            Self::ReturnToPending => &[Rejected, Suspended, Banned],
        }
    }
}

/// The audit record a transition will append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditDraft {
    pub action: String,
    pub reason: String,
    pub duration_days: Option<i32>,
}

/// Full column set written by one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub from: LifecycleState,
    pub to: LifecycleState,
    pub rejection_reason: Option<String>,
    pub suspension_reason: Option<String>,
    pub suspension_until: Option<DateTime<Utc>>,
    pub ban_reason: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub audit: AuditDraft,
}

/// Plan a transition without touching the store.
///
/// Fails with a validation error when the reason or duration is invalid, when
/// the current state does not allow the action, or when an onboarding action
/// is applied to a user account.
pub fn plan_transition(
    role: SubjectRole,
    from: LifecycleState,
    action: &ModerationAction,
    now: DateTime<Utc>,
) -> AppResult<TransitionPlan> {
    let action = action.clone().validated()?;
    let to = action.target();

    if !role.has_onboarding()
        && matches!(
            action,
            ModerationAction::Approve
                | ModerationAction::Reject { .. }
                | ModerationAction::ReturnToPending
        )
    {
        return Err(AppError::validation(format!(
            "Cannot {} a {role} account; {role}s have no onboarding review",
            action.name()
        )));
    }

    if !action.allowed_from().contains(&from) {
        return Err(AppError::validation(format!(
            "Cannot {} a {} {role}",
            action.name(),
            from.label_for(role)
        )));
    }

    let mut plan = TransitionPlan {
        from,
        to,
        rejection_reason: None,
        suspension_reason: None,
        suspension_until: None,
        ban_reason: None,
        is_verified: to == LifecycleState::Approved,
        is_active: to == LifecycleState::Approved,
        audit: AuditDraft {
            action: String::new(),
            reason: String::new(),
            duration_days: None,
        },
    };

    match action {
        ModerationAction::Approve => plan.audit.action = "Approved".to_string(),
        ModerationAction::Reject { reason } => {
            plan.audit.action = "Rejected".to_string();
            plan.rejection_reason = Some(reason.clone());
            plan.audit.reason = reason;
        }
        ModerationAction::Suspend { reason, days } => {
            let until = now
                .checked_add_signed(Duration::days(i64::from(days)))
                .ok_or_else(|| AppError::validation("Suspension duration is too long"))?;
            plan.audit.action = format!("Suspended {days}d");
            plan.audit.duration_days = Some(days);
            plan.suspension_reason = Some(reason.clone());
            plan.suspension_until = Some(until);
            plan.audit.reason = reason;
        }
        ModerationAction::Ban { reason } => {
            plan.audit.action = "Banned".to_string();
            plan.ban_reason = Some(reason.clone());
            plan.audit.reason = reason;
        }
        ModerationAction::Reactivate => plan.audit.action = "Reactivated".to_string(),
        ModerationAction::ReturnToPending => {
            plan.audit.action = "Returned to Requests".to_string();
        }
    }

    Ok(plan)
}

/// Listing filter for one role's subjects.
#[derive(Debug, Clone, Default)]
pub struct SubjectFilter {
    pub state: Option<LifecycleState>,
    /// Case-insensitive match against name and username.
    pub search: Option<String>,
}

impl SubjectFilter {
    /// Whether a subject passes the filter.
    #[must_use]
    pub fn matches(&self, subject: &subject::Model) -> bool {
        if self
            .state
            .is_some_and(|state| subject.state().ok() != Some(state))
        {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                subject.name.to_lowercase().contains(&needle)
                    || subject
                        .username
                        .as_deref()
                        .is_some_and(|u| u.to_lowercase().contains(&needle))
            }
        }
    }
}

/// A subject as listed on a moderation screen.
#[derive(Debug, Clone)]
pub struct SubjectView {
    pub subject: subject::Model,
    pub state: LifecycleState,
    pub state_label: &'static str,
    pub reason: Option<String>,
    pub suspension_expired: bool,
}

impl SubjectView {
    /// Normalize a loaded subject and run the expiry check against `now`.
    pub fn load(subject: subject::Model, now: DateTime<Utc>) -> AppResult<Self> {
        let state = subject.state()?;
        Ok(Self {
            state,
            state_label: state.label_for(subject.role),
            reason: subject.reason().map(String::from),
            suspension_expired: subject.is_suspension_expired(now),
            subject,
        })
    }
}

/// Moderation engine bound to one subject role.
#[derive(Clone)]
pub struct ModerationService {
    role: SubjectRole,
    subject_repo: SubjectRepository,
    audit_repo: AuditRecordRepository,
    id_gen: IdGenerator,
}

impl ModerationService {
    /// Create a new moderation service for `role`.
    #[must_use]
    pub const fn new(
        role: SubjectRole,
        subject_repo: SubjectRepository,
        audit_repo: AuditRecordRepository,
    ) -> Self {
        Self {
            role,
            subject_repo,
            audit_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Role this engine moderates.
    #[must_use]
    pub const fn role(&self) -> SubjectRole {
        self.role
    }

    /// Get a subject of this engine's role.
    pub async fn get_subject(&self, id: &str) -> AppResult<subject::Model> {
        let subject = self.subject_repo.get_by_id(id).await?;
        if subject.role != self.role {
            return Err(AppError::NotFound(format!("{} {id} not found", self.role)));
        }
        Ok(subject)
    }

    /// List this role's subjects.
    pub async fn list_subjects(&self, filter: &SubjectFilter) -> AppResult<Vec<SubjectView>> {
        let now = Utc::now();
        self.subject_repo
            .list_by_role(self.role, filter.state)
            .await?
            .into_iter()
            .filter(|s| filter.matches(s))
            .map(|s| SubjectView::load(s, now))
            .collect()
    }

    /// Approve pending subjects.
    pub async fn approve(
        &self,
        session: &admin_session::Model,
        ids: &[String],
    ) -> AppResult<BulkOutcome<subject::Model>> {
        self.apply_many(session, ids, ModerationAction::Approve)
            .await
    }

    /// Reject pending subjects with a shared reason.
    pub async fn reject(
        &self,
        session: &admin_session::Model,
        ids: &[String],
        reason: &str,
    ) -> AppResult<BulkOutcome<subject::Model>> {
        let action = ModerationAction::Reject {
            reason: reason.to_string(),
        };
        self.apply_many(session, ids, action).await
    }

    /// Suspend an approved subject for `days` days.
    pub async fn suspend(
        &self,
        session: &admin_session::Model,
        id: &str,
        reason: &str,
        days: i32,
    ) -> AppResult<subject::Model> {
        let action = ModerationAction::Suspend {
            reason: reason.to_string(),
            days,
        };
        self.apply(session, id, action).await
    }

    /// Ban an approved or suspended subject.
    pub async fn ban(
        &self,
        session: &admin_session::Model,
        id: &str,
        reason: &str,
    ) -> AppResult<subject::Model> {
        let action = ModerationAction::Ban {
            reason: reason.to_string(),
        };
        self.apply(session, id, action).await
    }

    /// Lift a suspension or ban.
    pub async fn reactivate(
        &self,
        session: &admin_session::Model,
        id: &str,
    ) -> AppResult<subject::Model> {
        self.apply(session, id, ModerationAction::Reactivate).await
    }

    /// Send a rejected, suspended or banned subject back to review.
    pub async fn return_to_pending(
        &self,
        session: &admin_session::Model,
        id: &str,
    ) -> AppResult<subject::Model> {
        self.apply(session, id, ModerationAction::ReturnToPending)
            .await
    }

    /// Apply one transition to one subject.
    pub async fn apply(
        &self,
        session: &admin_session::Model,
        id: &str,
        action: ModerationAction,
    ) -> AppResult<subject::Model> {
        let action = action.validated()?;
        let subject = self.get_subject(id).await?;
        self.transition(session, subject, &action, Utc::now()).await
    }

    /// Reactivate every suspension of this role that has run out.
    pub async fn sweep_expired_suspensions(
        &self,
        session: &admin_session::Model,
    ) -> AppResult<BulkOutcome<subject::Model>> {
        let now = Utc::now();
        let expired = self
            .subject_repo
            .list_expired_suspensions(self.role, now)
            .await?;

        let mut outcome = BulkOutcome::new();
        for subject in expired {
            let id = subject.id.clone();
            let result = self
                .transition(session, subject, &ModerationAction::Reactivate, now)
                .await;
            outcome.push(id, result);
        }

        tracing::info!(
            role = %self.role,
            reactivated = outcome.succeeded(),
            failed = outcome.failed(),
            "Swept expired suspensions"
        );
        Ok(outcome)
    }

    /// Audit history for this role, or for one subject, newest first.
    pub async fn history(
        &self,
        subject_id: Option<&str>,
    ) -> AppResult<Vec<audit_record::Model>> {
        self.audit_repo
            .list(self.role, subject_id, HISTORY_LIMIT)
            .await
    }

    async fn apply_many(
        &self,
        session: &admin_session::Model,
        ids: &[String],
        action: ModerationAction,
    ) -> AppResult<BulkOutcome<subject::Model>> {
        let action = action.validated()?;
        if !self.role.has_onboarding() {
            return Err(AppError::validation(format!(
                "Cannot {} a {role} account; {role}s have no onboarding review",
                action.name(),
                role = self.role
            )));
        }
        let selection = normalize_selection(ids, "subjects")?;

        let mut outcome = BulkOutcome::new();
        for id in selection {
            let result = match self.get_subject(&id).await {
                Ok(subject) => {
                    self.transition(session, subject, &action, Utc::now())
                        .await
                }
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                tracing::warn!(subject_id = %id, action = action.name(), error = %e, "Bulk item failed");
            }
            outcome.push(id, result);
        }
        Ok(outcome)
    }

    async fn transition(
        &self,
        session: &admin_session::Model,
        subject: subject::Model,
        action: &ModerationAction,
        now: DateTime<Utc>,
    ) -> AppResult<subject::Model> {
        let from = subject.state()?;
        let plan = plan_transition(self.role, from, action, now)?;
        let subject_id = subject.id.clone();

        let mut active: subject::ActiveModel = subject.into();
        active.lifecycle_state = Set(Some(plan.to.as_str().to_string()));
        active.rejection_reason = Set(plan.rejection_reason);
        active.suspension_reason = Set(plan.suspension_reason);
        active.suspension_until = Set(plan.suspension_until.map(Into::into));
        active.ban_reason = Set(plan.ban_reason);
        active.is_verified = Set(plan.is_verified);
        active.is_active = Set(plan.is_active);
        active.updated_at = Set(Some(now.into()));

        let record = audit_record::ActiveModel {
            id: Set(self.id_gen.generate()),
            subject_id: Set(subject_id.clone()),
            role: Set(self.role),
            action: Set(plan.audit.action.clone()),
            reason: Set(plan.audit.reason),
            duration_days: Set(plan.audit.duration_days),
            actor: Set(Some(session.username.clone())),
            timestamp: Set(now.into()),
        };

        let updated = self.subject_repo.update(active).await;
        let logged = self.audit_repo.create(record).await;

        match (updated, logged) {
            (Ok(subject), Ok(_)) => {
                tracing::info!(
                    subject_id = %subject_id,
                    role = %self.role,
                    action = %plan.audit.action,
                    from = %plan.from,
                    to = %plan.to,
                    actor = %session.username,
                    "Subject transitioned"
                );
                Ok(subject)
            }
            (Err(e), Ok(_)) => {
                tracing::warn!(subject_id = %subject_id, error = %e, "Subject update failed");
                Err(e)
            }
            (Ok(_), Err(e)) => {
                tracing::error!(subject_id = %subject_id, error = %e, "Audit record insert failed");
                Err(AppError::AuditLog(format!(
                    "{} {subject_id} is now {} but its audit record was not written: {e}",
                    self.role, plan.to
                )))
            }
            (Err(update_err), Err(audit_err)) => {
                tracing::error!(
                    subject_id = %subject_id,
                    update_error = %update_err,
                    audit_error = %audit_err,
                    "Subject update and audit record insert both failed"
                );
                Err(AppError::Database(format!(
                    "{} {subject_id} was not updated ({update_err}) and its audit record was not written ({audit_err})",
                    self.role
                )))
            }
        }
    }
}

/// One moderation engine per subject role.
#[derive(Clone)]
pub struct ModerationEngines {
    pub chef: ModerationService,
    pub rider: ModerationService,
    pub user: ModerationService,
}

impl ModerationEngines {
    /// Build the three engines over shared repositories.
    #[must_use]
    pub fn new(subject_repo: &SubjectRepository, audit_repo: &AuditRecordRepository) -> Self {
        let engine =
            |role| ModerationService::new(role, subject_repo.clone(), audit_repo.clone());
        Self {
            chef: engine(SubjectRole::Chef),
            rider: engine(SubjectRole::Rider),
            user: engine(SubjectRole::User),
        }
    }

    /// Engine for a role.
    #[must_use]
    pub const fn for_role(&self, role: SubjectRole) -> &ModerationService {
        match role {
            SubjectRole::Chef => &self.chef,
            SubjectRole::Rider => &self.rider,
            SubjectRole::User => &self.user,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Transaction};
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

    fn create_test_subject(id: &str, role: SubjectRole, state: &str) -> subject::Model {
        subject::Model {
            id: id.to_string(),
            role,
            name: format!("Subject {id}"),
            username: Some(format!("handle_{id}")),
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

    fn create_test_record(subject_id: &str, action: &str) -> audit_record::Model {
        audit_record::Model {
            id: "rec".to_string(),
            subject_id: subject_id.to_string(),
            role: SubjectRole::Chef,
            action: action.to_string(),
            reason: String::new(),
            duration_days: None,
            actor: Some("ops-admin".to_string()),
            timestamp: Utc::now().into(),
        }
    }

    fn service(db: &Arc<DatabaseConnection>, role: SubjectRole) -> ModerationService {
        ModerationService::new(
            role,
            SubjectRepository::new(db.clone()),
            AuditRecordRepository::new(db.clone()),
        )
    }

    fn transaction_log(db: Arc<DatabaseConnection>) -> Vec<Transaction> {
        Arc::try_unwrap(db).unwrap().into_transaction_log()
    }

    fn writes(log: &[Transaction]) -> usize {
        let log = format!("{log:?}");
        log.matches("sql: \"UPDATE").count() + log.matches("sql: \"INSERT").count()
    }

    // Pure planning

    #[test]
    fn test_plan_allows_only_the_documented_edges() {
        use LifecycleState::{Approved, Banned, Pending, Rejected, Suspended};
        let now = Utc::now();
        let reason = "r".to_string();
        let cases = [
            (ModerationAction::Approve, vec![Pending]),
            (ModerationAction::Reject { reason: reason.clone() }, vec![Pending]),
            (ModerationAction::Suspend { reason: reason.clone(), days: 3 }, vec![Approved]),
            (ModerationAction::Ban { reason }, vec![Approved, Suspended]),
            (ModerationAction::Reactivate, vec![Suspended, Banned]),
            (ModerationAction::ReturnToPending, vec![Rejected, Suspended, Banned]),
        ];

        for (action, allowed) in cases {
            for from in LifecycleState::ALL {
                let result = plan_transition(SubjectRole::Chef, from, &action, now);
                assert_eq!(
                    result.is_ok(),
                    allowed.contains(&from),
                    "{} from {from}",
                    action.name()
                );
            }
        }
    }

    #[test]
    fn test_plan_rejects_blank_reasons() {
        let now = Utc::now();
        for action in [
            ModerationAction::Reject { reason: "   ".to_string() },
            ModerationAction::Suspend { reason: String::new(), days: 7 },
            ModerationAction::Ban { reason: "\t\n".to_string() },
        ] {
            let from = if matches!(action, ModerationAction::Reject { .. }) {
                LifecycleState::Pending
            } else {
                LifecycleState::Approved
            };
            let err = plan_transition(SubjectRole::Rider, from, &action, now).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[test]
    fn test_plan_rejects_non_positive_days() {
        let now = Utc::now();
        for days in [0, -1] {
            let action = ModerationAction::Suspend {
                reason: "late".to_string(),
                days,
            };
            let err =
                plan_transition(SubjectRole::Chef, LifecycleState::Approved, &action, now)
                    .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[test]
    fn test_plan_suspend_sets_expiry_and_audit_label() {
        let now = Utc::now();
        let action = ModerationAction::Suspend {
            reason: " late ".to_string(),
            days: 7,
        };
        let plan =
            plan_transition(SubjectRole::Rider, LifecycleState::Approved, &action, now).unwrap();

        assert_eq!(plan.to, LifecycleState::Suspended);
        assert_eq!(plan.suspension_until, Some(now + Duration::days(7)));
        assert_eq!(plan.suspension_reason.as_deref(), Some("late"));
        assert_eq!(plan.audit.action, "Suspended 7d");
        assert_eq!(plan.audit.duration_days, Some(7));
        assert!(!plan.is_active);
    }

    #[test]
    fn test_plan_ban_clears_suspension() {
        let plan = plan_transition(
            SubjectRole::Chef,
            LifecycleState::Suspended,
            &ModerationAction::Ban {
                reason: "fraud".to_string(),
            },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(plan.ban_reason.as_deref(), Some("fraud"));
        assert!(plan.suspension_reason.is_none());
        assert!(plan.suspension_until.is_none());
        assert_eq!(plan.audit.action, "Banned");
    }

    #[test]
    fn test_plan_return_clears_every_reason() {
        for from in [
            LifecycleState::Rejected,
            LifecycleState::Suspended,
            LifecycleState::Banned,
        ] {
            let plan = plan_transition(
                SubjectRole::Chef,
                from,
                &ModerationAction::ReturnToPending,
                Utc::now(),
            )
            .unwrap();
            assert_eq!(plan.to, LifecycleState::Pending);
            assert!(plan.rejection_reason.is_none());
            assert!(plan.suspension_reason.is_none());
            assert!(plan.suspension_until.is_none());
            assert!(plan.ban_reason.is_none());
            assert_eq!(plan.audit.action, "Returned to Requests");
        }
    }

    #[test]
    fn test_users_have_no_onboarding_actions() {
        let now = Utc::now();
        for action in [
            ModerationAction::Approve,
            ModerationAction::ReturnToPending,
        ] {
            for from in LifecycleState::ALL {
                let err = plan_transition(SubjectRole::User, from, &action, now).unwrap_err();
                assert!(matches!(err, AppError::Validation(_)));
            }
        }

        let ban = ModerationAction::Ban {
            reason: "abuse".to_string(),
        };
        assert!(plan_transition(SubjectRole::User, LifecycleState::Approved, &ban, now).is_ok());
    }

    #[test]
    fn test_round_trip_ends_clean() {
        let now = Utc::now();
        let steps = [
            (LifecycleState::Pending, ModerationAction::Approve),
            (
                LifecycleState::Approved,
                ModerationAction::Suspend {
                    reason: "late".to_string(),
                    days: 2,
                },
            ),
            (LifecycleState::Suspended, ModerationAction::ReturnToPending),
            (LifecycleState::Pending, ModerationAction::Approve),
        ];

        let mut state = LifecycleState::Pending;
        let mut last = None;
        for (expected_from, action) in steps {
            assert_eq!(state, expected_from);
            let plan = plan_transition(SubjectRole::Chef, state, &action, now).unwrap();
            state = plan.to;
            last = Some(plan);
        }

        let last = last.unwrap();
        assert_eq!(state, LifecycleState::Approved);
        assert!(last.is_verified);
        assert!(last.rejection_reason.is_none());
        assert!(last.suspension_until.is_none());
    }

    #[test]
    fn test_filter_search_matches_name_and_username() {
        let subject = create_test_subject("u1", SubjectRole::User, "approved");
        let by_name = SubjectFilter {
            state: None,
            search: Some("SUBJECT".to_string()),
        };
        let by_handle = SubjectFilter {
            state: Some(LifecycleState::Approved),
            search: Some("handle_u".to_string()),
        };
        let wrong_state = SubjectFilter {
            state: Some(LifecycleState::Banned),
            search: None,
        };

        assert!(by_name.matches(&subject));
        assert!(by_handle.matches(&subject));
        assert!(!wrong_state.matches(&subject));
    }

    // Store interaction

    #[tokio::test]
    async fn test_reject_with_blank_reason_writes_nothing() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(&db, SubjectRole::Chef);

        let err = svc
            .reject(&session(), &["c1".to_string()], "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        drop(svc);
        assert!(transaction_log(db).is_empty());
    }

    #[tokio::test]
    async fn test_suspend_from_pending_writes_nothing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_subject("r1", SubjectRole::Rider, "pending")]])
                .into_connection(),
        );
        let svc = service(&db, SubjectRole::Rider);

        let err = svc.suspend(&session(), "r1", "late", 3).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        drop(svc);
        let log = transaction_log(db);
        assert_eq!(log.len(), 1);
        assert_eq!(writes(&log), 0);
    }

    #[tokio::test]
    async fn test_suspend_updates_subject_and_appends_record() {
        let mut suspended = create_test_subject("r1", SubjectRole::Rider, "suspended");
        suspended.suspension_reason = Some("late".to_string());
        suspended.suspension_until = Some((Utc::now() + Duration::days(7)).into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_subject("r1", SubjectRole::Rider, "approved")]])
                .append_query_results([[suspended]])
                .append_query_results([[create_test_record("r1", "Suspended 7d")]])
                .into_connection(),
        );
        let svc = service(&db, SubjectRole::Rider);

        let updated = svc.suspend(&session(), "r1", "late", 7).await.unwrap();
        assert_eq!(updated.state().unwrap(), LifecycleState::Suspended);

        drop(svc);
        let log = transaction_log(db);
        assert_eq!(writes(&log), 2);
        let statements = format!("{log:?}");
        assert!(statements.contains("audit_record"));
        assert!(statements.contains("Suspended 7d"));
        assert!(statements.contains("ops-admin"));
    }

    #[tokio::test]
    async fn test_subject_of_another_role_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_subject("c1", SubjectRole::Chef, "approved")]])
                .into_connection(),
        );
        let svc = service(&db, SubjectRole::Rider);

        let err = svc.ban(&session(), "c1", "fraud").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_audit_failure_is_reported_separately() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_subject("c1", SubjectRole::Chef, "banned")]])
                .append_query_results([[create_test_subject("c1", SubjectRole::Chef, "approved")]])
                .append_query_errors([sea_orm::DbErr::Custom("audit table locked".to_string())])
                .into_connection(),
        );
        let svc = service(&db, SubjectRole::Chef);

        let err = svc.reactivate(&session(), "c1").await.unwrap_err();
        assert!(matches!(err, AppError::AuditLog(_)));
    }

    #[tokio::test]
    async fn test_audit_is_attempted_when_subject_update_fails() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_subject("c1", SubjectRole::Chef, "pending")]])
                .append_query_errors([sea_orm::DbErr::Custom("connection reset".to_string())])
                .append_query_results([[create_test_record("c1", "Approved")]])
                .into_connection(),
        );
        let svc = service(&db, SubjectRole::Chef);

        let outcome = svc.approve(&session(), &["c1".to_string()]).await.unwrap();
        assert_eq!(outcome.failed_ids(), ["c1"]);
        assert!(matches!(outcome.items[0].result, Err(AppError::Database(_))));

        drop(svc);
        assert_eq!(writes(&transaction_log(db)), 2);
    }

    #[tokio::test]
    async fn test_bulk_approve_continues_past_missing_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<subject::Model>::new()])
                .append_query_results([[create_test_subject("c2", SubjectRole::Chef, "pending")]])
                .append_query_results([[create_test_subject("c2", SubjectRole::Chef, "approved")]])
                .append_query_results([[create_test_record("c2", "Approved")]])
                .into_connection(),
        );
        let svc = service(&db, SubjectRole::Chef);

        let ids = vec!["c1".to_string(), "c2".to_string(), "c1".to_string()];
        let outcome = svc.approve(&session(), &ids).await.unwrap();

        assert_eq!(outcome.items.len(), 2);
        assert!(matches!(outcome.items[0].result, Err(AppError::NotFound(_))));
        assert_eq!(outcome.items[1].id, "c2");
        assert!(outcome.items[1].result.is_ok());
    }

    #[tokio::test]
    async fn test_bulk_approve_on_users_is_rejected_up_front() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(&db, SubjectRole::User);

        let err = svc
            .approve(&session(), &["u1".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        drop(svc);
        assert!(transaction_log(db).is_empty());
    }

    #[tokio::test]
    async fn test_sweep_reactivates_expired_suspensions() {
        let mut expired = create_test_subject("r1", SubjectRole::Rider, "suspended");
        expired.suspension_reason = Some("late".to_string());
        expired.suspension_until = Some((Utc::now() - Duration::hours(1)).into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[expired]])
                .append_query_results([[create_test_subject("r1", SubjectRole::Rider, "approved")]])
                .append_query_results([[create_test_record("r1", "Reactivated")]])
                .into_connection(),
        );
        let svc = service(&db, SubjectRole::Rider);

        let outcome = svc.sweep_expired_suspensions(&session()).await.unwrap();
        assert_eq!(outcome.succeeded(), 1);
        let rider = outcome.items[0].result.as_ref().unwrap();
        assert!(rider.is_active);
    }

    #[tokio::test]
    async fn test_list_marks_expired_suspensions() {
        let mut expired = create_test_subject("r1", SubjectRole::Rider, "suspended");
        expired.suspension_reason = Some("late".to_string());
        expired.suspension_until = Some((Utc::now() - Duration::days(1)).into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[expired, create_test_subject("r2", SubjectRole::Rider, "denied")]])
                .into_connection(),
        );
        let svc = service(&db, SubjectRole::Rider);

        let views = svc.list_subjects(&SubjectFilter::default()).await.unwrap();
        assert_eq!(views.len(), 2);
        assert!(views[0].suspension_expired);
        assert_eq!(views[0].reason.as_deref(), Some("late"));
        assert_eq!(views[1].state, LifecycleState::Rejected);
    }

    #[tokio::test]
    async fn test_user_without_stored_state_is_active_and_suspendable() {
        let mut unset = create_test_subject("u1", SubjectRole::User, "");
        unset.lifecycle_state = None;

        let view = SubjectView::load(unset.clone(), Utc::now()).unwrap();
        assert_eq!(view.state, LifecycleState::Approved);
        assert_eq!(view.state_label, "active");

        let mut suspended = create_test_subject("u1", SubjectRole::User, "suspended");
        suspended.suspension_reason = Some("abuse".to_string());
        suspended.suspension_until = Some((Utc::now() + Duration::days(3)).into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[unset]])
                .append_query_results([[suspended]])
                .append_query_results([[create_test_record("u1", "Suspended 3d")]])
                .into_connection(),
        );
        let svc = service(&db, SubjectRole::User);

        let updated = svc.suspend(&session(), "u1", "abuse", 3).await.unwrap();
        assert_eq!(updated.state().unwrap(), LifecycleState::Suspended);

        drop(svc);
        let log = transaction_log(db);
        assert_eq!(writes(&log), 2);
        assert!(format!("{log:?}").contains("\"suspended\""));
    }

    #[test]
    fn test_engines_route_by_role() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let engines = ModerationEngines::new(
            &SubjectRepository::new(db.clone()),
            &AuditRecordRepository::new(db),
        );
        for role in [SubjectRole::Chef, SubjectRole::Rider, SubjectRole::User] {
            assert_eq!(engines.for_role(role).role(), role);
        }
    }
}
