//! Complaint ticket repository.

use std::sync::Arc;

use forkd_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

use crate::entities::{
    ComplaintTicket,
    complaint_ticket::{self, TicketStatus},
    subject::SubjectRole,
};

/// Repository for complaint tickets.
#[derive(Clone)]
pub struct ComplaintRepository {
    db: Arc<DatabaseConnection>,
}

impl ComplaintRepository {
    /// Create a new complaint repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a ticket by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<complaint_ticket::Model>> {
        ComplaintTicket::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a ticket by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<complaint_ticket::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Complaint {id} not found")))
    }

    /// List tickets, newest first.
    pub async fn list(
        &self,
        category: Option<SubjectRole>,
        status: Option<TicketStatus>,
    ) -> AppResult<Vec<complaint_ticket::Model>> {
        let mut query = ComplaintTicket::find();

        if let Some(category) = category {
            query = query.filter(complaint_ticket::Column::Category.eq(category));
        }
        if let Some(status) = status {
            query = query.filter(complaint_ticket::Column::Status.eq(status));
        }

        query
            .order_by_desc(complaint_ticket::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a ticket.
    pub async fn create(
        &self,
        model: complaint_ticket::ActiveModel,
    ) -> AppResult<complaint_ticket::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a ticket.
    pub async fn update(
        &self,
        model: complaint_ticket::ActiveModel,
    ) -> AppResult<complaint_ticket::Model> {
        model.update(self.db.as_ref()).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => AppError::NotFound("Complaint not found".to_string()),
            e => AppError::Database(e.to_string()),
        })
    }
}
