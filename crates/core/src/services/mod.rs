//! Business logic services.

#![allow(missing_docs)]

pub mod assignment;
pub mod auth;
pub mod bulk;
pub mod complaint;
pub mod moderation;

pub use assignment::{
    AssignRiderInput, AssignmentService, EARTH_RADIUS_KM, EtaEstimate, GeoPoint, MINUTES_PER_KM,
    estimate_eta, haversine_km,
};
pub use auth::AuthService;
pub use bulk::{BulkItem, BulkOutcome};
pub use complaint::{ComplaintService, Escalation, ResolveOutcome, TicketFilter};
pub use moderation::{
    ModerationAction, ModerationEngines, ModerationService, SubjectFilter, SubjectView,
    TransitionPlan, plan_transition,
};
