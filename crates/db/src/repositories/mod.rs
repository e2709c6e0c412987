//! Repository layer for database operations.

mod admin_session;
mod audit_record;
mod complaint;
mod delivery_order;
mod subject;

pub use admin_session::AdminSessionRepository;
pub use audit_record::AuditRecordRepository;
pub use complaint::ComplaintRepository;
pub use delivery_order::DeliveryOrderRepository;
pub use subject::SubjectRepository;
