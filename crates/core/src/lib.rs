//! Core business logic for forkd-admin.
//!
//! Hosts the moderation engines (one per subject role), complaint resolution,
//! rider assignment with ETA estimation, and admin session handling. Every
//! mutating operation takes the caller's [`AdminSession`] explicitly.

pub mod services;

pub use forkd_db::entities::admin_session::Model as AdminSession;
pub use services::*;
