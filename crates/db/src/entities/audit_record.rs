//! Moderation audit record entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::subject::SubjectRole;

/// One moderation transition. Rows are only ever inserted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub subject_id: String,
    /// Role of the subject at the time of the transition.
    pub role: SubjectRole,
    /// Human-readable transition label, e.g. "Suspended 7d".
    pub action: String,
    /// Empty for neutral actions.
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    /// Only set for suspensions.
    #[sea_orm(nullable)]
    pub duration_days: Option<i32>,
    /// Admin who performed the transition.
    #[sea_orm(nullable)]
    pub actor: Option<String>,
    pub timestamp: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::SubjectId",
        to = "super::subject::Column::Id"
    )]
    Subject,
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
