//! Admin session repository.

use std::sync::Arc;

use forkd_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};

use crate::entities::{AdminSession, admin_session};

/// Repository for admin console sessions.
#[derive(Clone)]
pub struct AdminSessionRepository {
    db: Arc<DatabaseConnection>,
}

impl AdminSessionRepository {
    /// Create a new admin session repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Store a new session.
    pub async fn create(
        &self,
        model: admin_session::ActiveModel,
    ) -> AppResult<admin_session::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a session by its token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<admin_session::Model>> {
        AdminSession::find_by_id(token)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a session. Deleting an unknown token is not an error.
    pub async fn delete(&self, token: &str) -> AppResult<()> {
        AdminSession::delete_by_id(token)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
