//! Subject repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use forkd_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder,
};

use crate::entities::{
    Subject,
    subject::{self, LifecycleState, SubjectRole},
};

/// Repository for chef, rider and user accounts under moderation.
#[derive(Clone)]
pub struct SubjectRepository {
    db: Arc<DatabaseConnection>,
}

impl SubjectRepository {
    /// Create a new subject repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a subject by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<subject::Model>> {
        Subject::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a subject by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<subject::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Subject {id} not found")))
    }

    /// List subjects of a role, newest first.
    ///
    /// The state filter matches every stored spelling of the state. A missing
    /// value counts as the role's initial state, so a `pending` filter on
    /// users matches nothing.
    pub async fn list_by_role(
        &self,
        role: SubjectRole,
        state: Option<LifecycleState>,
    ) -> AppResult<Vec<subject::Model>> {
        let mut query = Subject::find().filter(subject::Column::Role.eq(role));

        if let Some(state) = state {
            let (spellings, matches_null) = state.stored_forms(role);
            if spellings.is_empty() && !matches_null {
                return Ok(Vec::new());
            }
            let mut cond =
                Condition::any().add(subject::Column::LifecycleState.is_in(spellings));
            if matches_null {
                cond = cond.add(subject::Column::LifecycleState.is_null());
            }
            query = query.filter(cond);
        }

        query
            .order_by_desc(subject::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Riders that can take orders.
    pub async fn list_active_riders(&self) -> AppResult<Vec<subject::Model>> {
        Subject::find()
            .filter(subject::Column::Role.eq(SubjectRole::Rider))
            .filter(subject::Column::IsActive.eq(true))
            .order_by_asc(subject::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Suspended subjects of a role whose suspension ended before `now`.
    pub async fn list_expired_suspensions(
        &self,
        role: SubjectRole,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<subject::Model>> {
        Subject::find()
            .filter(subject::Column::Role.eq(role))
            .filter(
                subject::Column::LifecycleState
                    .is_in(LifecycleState::Suspended.store_aliases().iter().copied()),
            )
            .filter(subject::Column::SuspensionUntil.lt(now))
            .order_by_asc(subject::Column::SuspensionUntil)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a subject.
    pub async fn update(&self, model: subject::ActiveModel) -> AppResult<subject::Model> {
        model.update(self.db.as_ref()).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => AppError::NotFound("Subject not found".to_string()),
            e => AppError::Database(e.to_string()),
        })
    }

    /// Insert a subject.
    pub async fn create(&self, model: subject::ActiveModel) -> AppResult<subject::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
