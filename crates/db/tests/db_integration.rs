//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `forkd_test`)
//!   `TEST_DB_PASSWORD` (default: `forkd_test`)
//!   `TEST_DB_NAME` (default: `postgres`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use forkd_db::{
    entities::subject::{LifecycleState, SubjectRole},
    repositories::SubjectRepository,
    test_utils::{TestDatabase, TestDbConfig, subject_fixture},
};
use sea_orm::Set;

async fn seeded(rows: &[(&str, SubjectRole, Option<&str>)]) -> (TestDatabase, SubjectRepository) {
    let db = TestDatabase::create().await.unwrap();
    let repo = SubjectRepository::new(Arc::new(db.connection().clone()));
    for (id, role, state) in rows {
        repo.create(subject_fixture(id, *role, *state)).await.unwrap();
    }
    (db, repo)
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_migrations_apply_on_fresh_database() {
    let db = TestDatabase::create().await;
    assert!(db.is_ok(), "Setup failed: {:?}", db.err());
    db.unwrap().drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_legacy_state_spellings_match_filters() {
    let (db, repo) = seeded(&[
        ("c1", SubjectRole::Chef, Some("denied")),
        ("c2", SubjectRole::Chef, None),
        ("c3", SubjectRole::Chef, Some("Rejected")),
        ("r1", SubjectRole::Rider, Some("rejected")),
    ])
    .await;

    let rejected = repo
        .list_by_role(SubjectRole::Chef, Some(LifecycleState::Rejected))
        .await
        .unwrap();
    assert_eq!(rejected.len(), 2);

    let pending = repo
        .list_by_role(SubjectRole::Chef, Some(LifecycleState::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, "c2");

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_expired_suspensions_are_listed() {
    let (db, repo) = seeded(&[]).await;

    let now = Utc::now();
    for (id, until) in [("r1", now - Duration::hours(1)), ("r2", now + Duration::days(2))] {
        let mut row = subject_fixture(id, SubjectRole::Rider, Some("suspended"));
        row.suspension_reason = Set(Some("Late deliveries".to_string()));
        row.suspension_until = Set(Some(until.into()));
        repo.create(row).await.unwrap();
    }

    let expired = repo
        .list_expired_suspensions(SubjectRole::Rider, now)
        .await
        .unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, "r1");

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(config.url_for("x").starts_with("postgres://"));
}
