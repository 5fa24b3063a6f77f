use crate::models::{DlqEvent, EventMirror};
use taylordash_core::{Database, Result};
use uuid::Uuid;

#[derive(Clone)]
pub struct EventRepository {
    db: Database,
}

impl EventRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Inserts a mirror row, relying on the `sequence` column's
    /// `GENERATED ALWAYS AS IDENTITY` default for the monotonic sequence
    /// (§4.6 step 5). Returns `None` if a unique-index violation on
    /// `(topic, message_id)` indicates this message was already mirrored.
    pub async fn insert_mirror(
        &self,
        topic: &str,
        kind: &str,
        message_id: Option<&str>,
        payload: &serde_json::Value,
        trace_id: Uuid,
    ) -> Result<Option<EventMirror>> {
        let result = sqlx::query_as::<_, EventMirror>(
            "INSERT INTO events_mirror (topic, kind, message_id, payload, trace_id)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (topic, message_id) WHERE message_id IS NOT NULL DO NOTHING
             RETURNING *",
        )
        .bind(topic)
        .bind(kind)
        .bind(message_id)
        .bind(payload)
        .bind(trace_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(result)
    }

    pub async fn list(
        &self,
        topic: Option<&str>,
        kind: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EventMirror>> {
        let events = sqlx::query_as::<_, EventMirror>(
            "SELECT * FROM events_mirror
             WHERE ($1::text IS NULL OR topic = $1)
               AND ($2::text IS NULL OR kind = $2)
             ORDER BY sequence DESC
             LIMIT $3 OFFSET $4",
        )
        .bind(topic)
        .bind(kind)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        Ok(events)
    }

    pub async fn insert_dlq(
        &self,
        original_topic: &str,
        failure_reason: &str,
        payload: &serde_json::Value,
    ) -> Result<DlqEvent> {
        let entry = sqlx::query_as::<_, DlqEvent>(
            "INSERT INTO dlq_events (original_topic, failure_reason, payload)
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(original_topic)
        .bind(failure_reason)
        .bind(payload)
        .fetch_one(self.db.pool())
        .await?;

        Ok(entry)
    }

    pub async fn list_dlq(&self, limit: i64, offset: i64) -> Result<Vec<DlqEvent>> {
        let entries = sqlx::query_as::<_, DlqEvent>(
            "SELECT * FROM dlq_events ORDER BY received_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        Ok(entries)
    }
}
