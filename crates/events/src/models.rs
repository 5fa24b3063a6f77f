use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A single row of `events_mirror` (§3 "EventMirror"). `sequence` is
/// DB-assigned and monotonic; it is never supplied by a caller.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EventMirror {
    pub sequence: i64,
    pub topic: String,
    pub kind: String,
    pub message_id: Option<String>,
    pub payload: serde_json::Value,
    pub received_at: DateTime<Utc>,
    pub trace_id: Uuid,
}

/// A single row of `dlq_events` (§3 "DLQEvent"). No dedup is applied here —
/// persistent failures for the same message accumulate entries and operators
/// drain manually (§4.6 "Failure semantics").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DlqEvent {
    pub id: Uuid,
    pub original_topic: String,
    pub failure_reason: String,
    pub payload: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

/// Fields the pipeline pulls out of an inbound payload (§6 "Bus topic
/// contract"). The payload is stored verbatim in `EventMirror::payload`;
/// these are just the bits ingest logic needs to inspect.
pub struct ParsedMessage {
    pub trace_id: Uuid,
    pub kind: String,
    pub message_id: Option<String>,
    pub payload: serde_json::Value,
}
