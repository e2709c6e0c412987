//! Moderatable subject entity (chef, rider or user account).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use forkd_common::{AppError, AppResult};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which actor population a subject belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum SubjectRole {
    #[sea_orm(string_value = "chef")]
    Chef,
    #[sea_orm(string_value = "rider")]
    Rider,
    #[sea_orm(string_value = "user")]
    User,
}

impl SubjectRole {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chef => "chef",
            Self::Rider => "rider",
            Self::User => "user",
        }
    }

    /// Whether subjects of this role go through onboarding review.
    ///
    /// User accounts start out active and are never `pending`.
    #[must_use]
    pub const fn has_onboarding(self) -> bool {
        !matches!(self, Self::User)
    }
}

impl fmt::Display for SubjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chef" | "chefs" => Ok(Self::Chef),
            "rider" | "riders" => Ok(Self::Rider),
            "user" | "users" => Ok(Self::User),
            other => Err(AppError::validation(format!("Unknown subject role '{other}'"))),
        }
    }
}

/// Moderation lifecycle state.
///
/// Stored as free text; older rows use `decision`-era spellings, so reads go
/// through [`LifecycleState::from_store`] and writes always use
/// [`LifecycleState::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Pending,
    Approved,
    Rejected,
    Suspended,
    Banned,
}

impl LifecycleState {
    /// All states in display order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::Suspended,
        Self::Banned,
    ];

    /// Canonical lowercase name, the only spelling ever written.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Suspended => "suspended",
            Self::Banned => "banned",
        }
    }

    /// Every stored spelling that reads back as this state.
    #[must_use]
    pub const fn store_aliases(self) -> &'static [&'static str] {
        match self {
            Self::Pending => &["pending", "Pending", "PENDING", ""],
            Self::Approved => &["approved", "Approved", "APPROVED", "active", "Active"],
            Self::Rejected => &["rejected", "Rejected", "REJECTED", "denied", "Denied"],
            Self::Suspended => &["suspended", "Suspended", "SUSPENDED"],
            Self::Banned => &["banned", "Banned", "BANNED"],
        }
    }

    /// Normalize a raw stored value for a subject of `role`.
    ///
    /// A missing value is the role's initial state. Users are never
    /// `pending`, so a stored `pending` on a user reads as `approved`.
    #[must_use]
    pub fn from_store(role: SubjectRole, raw: Option<&str>) -> Option<Self> {
        let raw = raw.map(str::trim).unwrap_or_default();
        let state = if raw.is_empty() {
            Self::Pending
        } else {
            Self::parse_name(raw)?
        };
        Some(state.normalized_for(role))
    }

    /// Map a state onto what `role` can actually be in.
    #[must_use]
    pub const fn normalized_for(self, role: SubjectRole) -> Self {
        match self {
            Self::Pending if !role.has_onboarding() => Self::Approved,
            state => state,
        }
    }

    /// Stored spellings that read back as this state for `role`, and whether
    /// a NULL column does too.
    #[must_use]
    pub fn stored_forms(self, role: SubjectRole) -> (Vec<&'static str>, bool) {
        match (self, role.has_onboarding()) {
            (Self::Pending, false) => (Vec::new(), false),
            (Self::Approved, false) => (
                [Self::Approved.store_aliases(), Self::Pending.store_aliases()].concat(),
                true,
            ),
            (Self::Pending, true) => (self.store_aliases().to_vec(), true),
            _ => (self.store_aliases().to_vec(), false),
        }
    }

    fn parse_name(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" | "active" => Some(Self::Approved),
            "rejected" | "denied" => Some(Self::Rejected),
            "suspended" => Some(Self::Suspended),
            "banned" => Some(Self::Banned),
            _ => None,
        }
    }

    /// Label shown for this state on a given role's screen.
    #[must_use]
    pub const fn label_for(self, role: SubjectRole) -> &'static str {
        match (self, role) {
            (Self::Approved, SubjectRole::User) => "active",
            _ => self.as_str(),
        }
    }

    /// Whether this state carries a moderation reason.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        matches!(self, Self::Rejected | Self::Suspended | Self::Banned)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_name(s.trim())
            .ok_or_else(|| AppError::validation(format!("Unknown lifecycle state '{s}'")))
    }
}

/// Subject model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subject")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub role: SubjectRole,
    pub name: String,
    /// Handle for user accounts.
    #[sea_orm(nullable)]
    pub username: Option<String>,
    /// Raw lifecycle value; read it through [`Model::state`].
    #[sea_orm(nullable)]
    pub lifecycle_state: Option<String>,
    pub is_verified: bool,
    /// Riders: eligible for order assignment.
    pub is_active: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub suspension_reason: Option<String>,
    #[sea_orm(nullable)]
    pub suspension_until: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub ban_reason: Option<String>,
    /// Identity documents and certificate images, not interpreted here.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub documents: Option<Json>,
    #[sea_orm(nullable)]
    pub location_lat: Option<f64>,
    #[sea_orm(nullable)]
    pub location_lng: Option<f64>,
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Normalized lifecycle state.
    pub fn state(&self) -> AppResult<LifecycleState> {
        LifecycleState::from_store(self.role, self.lifecycle_state.as_deref()).ok_or_else(|| {
            AppError::Database(format!(
                "Subject {} has unknown lifecycle state '{}'",
                self.id,
                self.lifecycle_state.as_deref().unwrap_or_default()
            ))
        })
    }

    /// The moderation reason belonging to the current state.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self.state().ok()? {
            LifecycleState::Rejected => self.rejection_reason.as_deref(),
            LifecycleState::Suspended => self.suspension_reason.as_deref(),
            LifecycleState::Banned => self.ban_reason.as_deref(),
            LifecycleState::Pending | LifecycleState::Approved => None,
        }
    }

    /// Pull-based expiry check for suspensions.
    #[must_use]
    pub fn is_suspension_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.state(), Ok(LifecycleState::Suspended))
            && self
                .suspension_until
                .is_some_and(|until| until.with_timezone(&Utc) < now)
    }

    /// Exactly the reason columns of the current state are populated.
    #[must_use]
    pub fn has_consistent_state_fields(&self) -> bool {
        let Ok(state) = self.state() else {
            return false;
        };
        let rejected = self.rejection_reason.is_some();
        let suspended = self.suspension_reason.is_some() && self.suspension_until.is_some();
        let suspension_clear = self.suspension_reason.is_none() && self.suspension_until.is_none();
        let banned = self.ban_reason.is_some();

        match state {
            LifecycleState::Pending | LifecycleState::Approved => {
                !rejected && suspension_clear && !banned
            }
            LifecycleState::Rejected => rejected && suspension_clear && !banned,
            LifecycleState::Suspended => !rejected && suspended && !banned,
            LifecycleState::Banned => !rejected && suspension_clear && banned,
        }
    }

    /// Rider coordinates, when both are known.
    #[must_use]
    pub fn location(&self) -> Option<(f64, f64)> {
        self.location_lat.zip(self.location_lng)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::audit_record::Entity")]
    AuditRecord,
}

impl Related<super::audit_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuditRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn subject(state: Option<&str>) -> Model {
        subject_with_role(SubjectRole::Chef, state)
    }

    fn subject_with_role(role: SubjectRole, state: Option<&str>) -> Model {
        Model {
            id: "s1".to_string(),
            role,
            name: "Meera Nair".to_string(),
            username: None,
            lifecycle_state: state.map(String::from),
            is_verified: false,
            is_active: false,
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

    #[test]
    fn test_missing_state_reads_as_pending() {
        assert_eq!(subject(None).state().unwrap(), LifecycleState::Pending);
        assert_eq!(subject(Some("")).state().unwrap(), LifecycleState::Pending);
    }

    #[test]
    fn test_user_without_stored_state_is_approved() {
        for raw in [None, Some(""), Some("pending")] {
            let user = subject_with_role(SubjectRole::User, raw);
            assert_eq!(user.state().unwrap(), LifecycleState::Approved);
        }
        let rider = subject_with_role(SubjectRole::Rider, None);
        assert_eq!(rider.state().unwrap(), LifecycleState::Pending);
    }

    #[test]
    fn test_user_forms_fold_pending_into_approved() {
        let (pending, pending_null) = LifecycleState::Pending.stored_forms(SubjectRole::User);
        assert!(pending.is_empty());
        assert!(!pending_null);

        let (approved, approved_null) = LifecycleState::Approved.stored_forms(SubjectRole::User);
        assert!(approved_null);
        assert!(approved.contains(&"active"));
        assert!(approved.contains(&"pending"));

        let (_, chef_approved_null) = LifecycleState::Approved.stored_forms(SubjectRole::Chef);
        assert!(!chef_approved_null);
    }

    #[test]
    fn test_state_names_parse_without_empty() {
        assert_eq!("Denied".parse::<LifecycleState>().unwrap(), LifecycleState::Rejected);
        assert!("".parse::<LifecycleState>().is_err());
    }

    #[test]
    fn test_denied_is_a_synonym_for_rejected() {
        assert_eq!(subject(Some("denied")).state().unwrap(), LifecycleState::Rejected);
        assert_eq!(subject(Some("Rejected")).state().unwrap(), LifecycleState::Rejected);
        assert_eq!(subject(Some("active")).state().unwrap(), LifecycleState::Approved);
    }

    #[test]
    fn test_unknown_state_is_a_store_error() {
        let err = subject(Some("archived")).state().unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_aliases_cover_every_accepted_spelling() {
        for state in LifecycleState::ALL {
            for alias in state.store_aliases() {
                assert_eq!(
                    LifecycleState::from_store(SubjectRole::Chef, Some(alias)),
                    Some(state)
                );
            }
        }
    }

    #[test]
    fn test_reason_follows_state() {
        let mut s = subject(Some("suspended"));
        s.suspension_reason = Some("late deliveries".to_string());
        s.suspension_until = Some(Utc::now().into());
        assert_eq!(s.reason(), Some("late deliveries"));
        assert!(s.has_consistent_state_fields());

        s.ban_reason = Some("stale".to_string());
        assert!(!s.has_consistent_state_fields());
    }

    #[test]
    fn test_suspension_expiry() {
        let now = Utc::now();
        let mut s = subject(Some("suspended"));
        s.suspension_reason = Some("late".to_string());
        s.suspension_until = Some((now - Duration::hours(1)).into());
        assert!(s.is_suspension_expired(now));

        s.suspension_until = Some((now + Duration::hours(1)).into());
        assert!(!s.is_suspension_expired(now));

        let approved = subject(Some("approved"));
        assert!(!approved.is_suspension_expired(now));
    }

    #[test]
    fn test_user_approved_label() {
        assert_eq!(LifecycleState::Approved.label_for(SubjectRole::User), "active");
        assert_eq!(LifecycleState::Approved.label_for(SubjectRole::Chef), "approved");
        assert!(!SubjectRole::User.has_onboarding());
    }

    #[test]
    fn test_role_parsing_accepts_plural_tabs() {
        assert_eq!("Riders".parse::<SubjectRole>().unwrap(), SubjectRole::Rider);
        assert!("admins".parse::<SubjectRole>().is_err());
    }
}
