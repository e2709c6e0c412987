//! HTTP API layer for forkd-admin.
//!
//! This crate exposes the admin console over JSON:
//!
//! - **Endpoints**: sign-in, subject moderation per role, complaints, delivery
//! - **Extractors**: the authenticated admin session
//! - **Middleware**: bearer token resolution
//!
//! Built on Axum 0.8. Every endpoint is a `POST` with a camelCase JSON body.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
