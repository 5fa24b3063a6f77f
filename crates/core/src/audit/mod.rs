mod event;
mod logger;

pub use event::builders;
pub use event::{AuditEventBuilder, AuthAuditEvent, AuthEventType, PendingAuditEvent};
pub use logger::AuditLogger;
