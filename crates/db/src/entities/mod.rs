//! Database entities.

pub mod admin_session;
pub mod audit_record;
pub mod complaint_ticket;
pub mod delivery_order;
pub mod subject;

pub use admin_session::Entity as AdminSession;
pub use audit_record::Entity as AuditRecord;
pub use complaint_ticket::Entity as ComplaintTicket;
pub use delivery_order::Entity as DeliveryOrder;
pub use subject::Entity as Subject;
