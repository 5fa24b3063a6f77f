use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `AuthAuditEvent.event_type` per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventType {
    LoginSuccess,
    LoginFailed,
    Logout,
    SessionExpired,
    PasswordChanged,
    UserCreated,
    UserDeleted,
    UserUpdated,
}

impl std::fmt::Display for AuthEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Append-only authentication/authorization audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthAuditEvent {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub details: serde_json::Value,
}

/// An audit event not yet assigned an id/timestamp — those are set at
/// persistence time by [`crate::audit::AuditLogger`].
#[derive(Debug, Clone)]
pub struct PendingAuditEvent {
    pub user_id: Option<Uuid>,
    pub event_type: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub details: serde_json::Value,
}

/// Builds a [`PendingAuditEvent`]. Call sites that need no extra detail can
/// pass one straight to [`crate::audit::AuditLogger::record`]; call sites
/// that do chain `.detail(...)`/`.ip_address(...)`/`.user_agent(...)` before
/// handing the builder itself to `record`, which accepts either.
pub struct AuditEventBuilder {
    user_id: Option<Uuid>,
    event_type: AuthEventType,
    ip_address: Option<String>,
    user_agent: Option<String>,
    details: serde_json::Value,
}

impl AuditEventBuilder {
    pub fn new(event_type: AuthEventType) -> Self {
        Self {
            user_id: None,
            event_type,
            ip_address: None,
            user_agent: None,
            details: serde_json::json!({}),
        }
    }

    pub fn user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn ip_address(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    pub fn user_agent(mut self, ua: Option<String>) -> Self {
        self.user_agent = ua;
        self
    }

    pub fn detail(mut self, key: &str, value: impl Serialize) -> Self {
        if let Some(obj) = self.details.as_object_mut() {
            obj.insert(key.to_string(), serde_json::json!(value));
        }
        self
    }

    pub fn build(self) -> PendingAuditEvent {
        PendingAuditEvent {
            user_id: self.user_id,
            event_type: self.event_type.to_string().to_lowercase(),
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            details: self.details,
        }
    }
}

impl From<AuditEventBuilder> for PendingAuditEvent {
    fn from(builder: AuditEventBuilder) -> Self {
        builder.build()
    }
}

/// Typed builders per event type (SPEC_FULL.md §B), so call sites don't
/// hand-assemble the `details` JSON blob.
pub mod builders {
    use super::{AuditEventBuilder, AuthEventType, PendingAuditEvent};
    use uuid::Uuid;

    /// Chainable: callers typically attach `.ip_address(..)`/`.user_agent(..)`.
    pub fn login_success(user_id: Uuid) -> AuditEventBuilder {
        AuditEventBuilder::new(AuthEventType::LoginSuccess).user(user_id)
    }

    pub fn login_failed(username: &str, reason: &str, ip: Option<String>) -> PendingAuditEvent {
        AuditEventBuilder::new(AuthEventType::LoginFailed)
            .detail("username", username)
            .detail("reason", reason)
            .ip_address(ip)
            .build()
    }

    pub fn logout(user_id: Uuid) -> PendingAuditEvent {
        AuditEventBuilder::new(AuthEventType::Logout).user(user_id).build()
    }

    pub fn session_expired(user_id: Uuid) -> PendingAuditEvent {
        AuditEventBuilder::new(AuthEventType::SessionExpired).user(user_id).build()
    }

    pub fn password_changed(user_id: Uuid) -> PendingAuditEvent {
        AuditEventBuilder::new(AuthEventType::PasswordChanged).user(user_id).build()
    }

    /// Chainable: callers typically attach `.detail("username", ..)`.
    pub fn user_created(user_id: Uuid) -> AuditEventBuilder {
        AuditEventBuilder::new(AuthEventType::UserCreated).user(user_id)
    }

    pub fn user_deleted(user_id: Uuid) -> PendingAuditEvent {
        AuditEventBuilder::new(AuthEventType::UserDeleted).user(user_id).build()
    }

    pub fn user_updated(user_id: Uuid) -> PendingAuditEvent {
        AuditEventBuilder::new(AuthEventType::UserUpdated).user(user_id).build()
    }
}
