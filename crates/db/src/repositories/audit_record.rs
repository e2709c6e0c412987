//! Audit record repository.

use std::sync::Arc;

use forkd_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entities::{AuditRecord, audit_record, subject::SubjectRole};

/// Append-only store of moderation actions.
#[derive(Clone)]
pub struct AuditRecordRepository {
    db: Arc<DatabaseConnection>,
}

impl AuditRecordRepository {
    /// Create a new audit record repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a record.
    pub async fn create(&self, model: audit_record::ActiveModel) -> AppResult<audit_record::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Records for a role, optionally narrowed to one subject, newest first.
    pub async fn list(
        &self,
        role: SubjectRole,
        subject_id: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<audit_record::Model>> {
        let mut query = AuditRecord::find().filter(audit_record::Column::Role.eq(role));

        if let Some(subject_id) = subject_id {
            query = query.filter(audit_record::Column::SubjectId.eq(subject_id));
        }

        query
            .order_by_desc(audit_record::Column::Timestamp)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
