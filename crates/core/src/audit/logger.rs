use super::event::{AuthAuditEvent, PendingAuditEvent};
use crate::database::Database;
use crate::error::Result;
use chrono::Utc;
use uuid::Uuid;

/// Writes [`AuthAuditEvent`] rows. Append-only; retention ≥1 year is enforced
/// by the same retention sweeper that prunes `ApplicationLog` (§4.3).
#[derive(Clone)]
pub struct AuditLogger {
    db: Database,
}

impl AuditLogger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn record(&self, event: impl Into<PendingAuditEvent>) -> Result<AuthAuditEvent> {
        let event = event.into();
        let row = sqlx::query_as::<_, AuthAuditEvent>(
            r#"
            INSERT INTO auth_audit_events (id, user_id, event_type, timestamp, ip_address, user_agent, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, event_type, timestamp, ip_address, user_agent, details
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.user_id)
        .bind(&event.event_type)
        .bind(Utc::now())
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(&event.details)
        .fetch_one(self.db.pool())
        .await?;

        Ok(row)
    }

    pub async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<AuthAuditEvent>> {
        let rows = sqlx::query_as::<_, AuthAuditEvent>(
            r#"
            SELECT id, user_id, event_type, timestamp, ip_address, user_agent, details
            FROM auth_audit_events WHERE user_id = $1
            ORDER BY timestamp DESC LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }
}
