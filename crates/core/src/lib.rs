pub mod audit;
pub mod bus;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod security;
pub mod session;
pub mod types;
pub mod utils;

pub use audit::{AuditLogger, AuthAuditEvent, AuthEventType};
pub use bus::{BusAdapter, HandlerOutcome};
pub use config::Config;
pub use database::{Database, PoolStatus};
pub use error::{Environment, Error, ErrorCode, ErrorContext, ErrorMetrics, RequestContext, Result};
pub use logging::{init_tracing, RetentionSweeper};
pub use metrics::{MetricsRegistry, MetricsService, PlatformMetrics};
pub use security::PasswordHasher;
pub use session::{authorize, Session, SessionCleanupService, SessionStore};
pub use types::{Pagination, Role};

// Re-export commonly used types from dependencies
pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;
