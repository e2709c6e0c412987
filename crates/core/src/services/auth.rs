//! Admin sign-in and session tokens.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use chrono::{DateTime, Duration, Utc};
use forkd_common::{AppError, AppResult, IdGenerator, config::AdminConfig};
use forkd_db::{entities::admin_session, repositories::AdminSessionRepository};
use sea_orm::Set;

/// Admin authentication service.
#[derive(Clone)]
pub struct AuthService {
    session_repo: AdminSessionRepository,
    admin: AdminConfig,
    id_gen: IdGenerator,
}

impl AuthService {
    /// Create a new auth service.
    #[must_use]
    pub const fn new(session_repo: AdminSessionRepository, admin: AdminConfig) -> Self {
        Self {
            session_repo,
            admin,
            id_gen: IdGenerator::new(),
        }
    }

    /// Check the admin credentials and open a session.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<admin_session::Model> {
        let username_ok = username.trim() == self.admin.username;
        // Always verify so a wrong username costs the same as a wrong password
        let password_ok = verify_password(password, &self.admin.password_hash)?;

        if !(username_ok && password_ok) {
            tracing::warn!(username = %username, "Admin sign-in rejected");
            return Err(AppError::Unauthorized);
        }

        let now = Utc::now();
        let expires_at = session_expiry(now, self.admin.session_ttl_hours)?;
        let model = admin_session::ActiveModel {
            token: Set(self.id_gen.generate_token()),
            username: Set(self.admin.username.clone()),
            created_at: Set(now.into()),
            expires_at: Set(expires_at.into()),
        };

        let session = self.session_repo.create(model).await?;
        tracing::info!(username = %session.username, "Admin signed in");
        Ok(session)
    }

    /// Resolve a bearer token to a live session.
    pub async fn authenticate(&self, token: &str) -> AppResult<admin_session::Model> {
        let session = self
            .session_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !session.is_valid_at(Utc::now()) {
            return Err(AppError::Unauthorized);
        }
        Ok(session)
    }

    /// End a session.
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        self.session_repo.delete(token).await?;
        tracing::info!("Admin signed out");
        Ok(())
    }
}

fn session_expiry(now: DateTime<Utc>, ttl_hours: i64) -> AppResult<DateTime<Utc>> {
    Some(ttl_hours)
        .filter(|h| *h >= 1)
        .and_then(Duration::try_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| AppError::Config(format!("Invalid admin session TTL: {ttl_hours}h")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Config(format!("Invalid admin password hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
