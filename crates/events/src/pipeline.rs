//! Event Pipeline (C6): ingest → mirror → DLQ, per §4.6.

use crate::dedup::DedupCache;
use crate::repository::EventRepository;
use std::sync::Arc;
use std::time::Instant;
use taylordash_core::{BusAdapter, HandlerOutcome, PlatformMetrics, Result};
use tracing::{info, warn};
use uuid::Uuid;

/// Default subscriptions established at startup, per §6 "Bus topic
/// contract" conventions (`tracker/events/<domain>/<action>` for ingest,
/// `plugins/events/<action>` for lifecycle events).
pub const DEFAULT_TOPIC_PATTERNS: &[&str] = &["tracker/events/#", "plugins/events/#"];

#[derive(Clone)]
pub struct EventPipeline {
    repository: EventRepository,
    bus: BusAdapter,
    metrics: Arc<PlatformMetrics>,
    dedup: DedupCache,
}

impl EventPipeline {
    pub fn new(repository: EventRepository, bus: BusAdapter, metrics: Arc<PlatformMetrics>) -> Self {
        Self {
            repository,
            bus,
            metrics,
            dedup: DedupCache::new(),
        }
    }

    /// Subscribes to every pattern in `patterns`, dispatching each delivered
    /// message through [`Self::ingest`].
    pub async fn subscribe_all(&self, patterns: &[&str]) -> Result<()> {
        for pattern in patterns {
            let pipeline = self.clone();
            let pattern = pattern.to_string();
            self.bus
                .subscribe(
                    &pattern,
                    Arc::new(move |topic, payload| {
                        let pipeline = pipeline.clone();
                        Box::pin(async move { pipeline.ingest(topic, payload).await })
                    }),
                )
                .await?;
            info!(pattern, "event pipeline subscribed");
        }
        Ok(())
    }

    /// Ingests one delivered message (§4.6 steps 1-7). Never returns an
    /// error: every failure path is translated into a DLQ write and a
    /// `HandlerOutcome`, because the bus adapter's contract is ack/nack, not
    /// `Result`.
    pub async fn ingest(&self, topic: String, payload: Vec<u8>) -> HandlerOutcome {
        let started = Instant::now();

        let value: serde_json::Value = match serde_json::from_slice(&payload) {
            Ok(value) => value,
            Err(err) => {
                self.dlq(&topic, "unparseable payload", &serde_json::json!({
                    "raw_hex_preview": hex_preview(&payload),
                    "parse_error": err.to_string(),
                }))
                .await;
                self.metrics
                    .mqtt_dlq_total
                    .with_label_values(&[&topic, "parse_error"])
                    .inc();
                return HandlerOutcome::Ack;
            }
        };

        let trace_id = value
            .get("trace_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        let kind = value
            .get("event_type")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();

        let message_id = value
            .get("message_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        if let Some(message_id) = &message_id {
            if self.dedup.check_and_record(&topic, message_id) {
                info!(topic, message_id, "duplicate message within dedup window, acking without re-insert");
                return HandlerOutcome::Ack;
            }
        }

        let result = self
            .repository
            .insert_mirror(&topic, &kind, message_id.as_deref(), &value, trace_id)
            .await;

        match result {
            Ok(Some(_mirrored)) => {
                self.metrics
                    .mqtt_ingest_total
                    .with_label_values(&[&topic, &kind])
                    .inc();
                self.metrics
                    .mqtt_event_latency_seconds
                    .observe(started.elapsed().as_secs_f64());
                HandlerOutcome::Ack
            }
            Ok(None) => {
                // Unique-index dedup caught a replay the in-memory cache missed.
                HandlerOutcome::Ack
            }
            Err(err) => {
                warn!(topic, error = %err, "event mirror insert failed, sending to DLQ and nacking");
                self.dlq(&topic, &err.to_string(), &value).await;
                self.metrics
                    .mqtt_dlq_total
                    .with_label_values(&[&topic, "db_error"])
                    .inc();
                HandlerOutcome::Nack(err.to_string())
            }
        }
    }

    async fn dlq(&self, topic: &str, reason: &str, payload: &serde_json::Value) {
        if let Err(err) = self.repository.insert_dlq(topic, reason, payload).await {
            warn!(topic, reason, error = %err, "failed to write DLQ entry");
        }
    }

    /// §4.6 "Publish API": publishes to the bus; the pipeline will re-ingest
    /// and mirror the message through its own subscription.
    pub async fn publish(&self, topic: &str, kind: &str, mut payload: serde_json::Value) -> Result<()> {
        if let Some(obj) = payload.as_object_mut() {
            obj.entry("trace_id").or_insert_with(|| serde_json::json!(Uuid::new_v4()));
            obj.entry("event_type").or_insert_with(|| serde_json::json!(kind));
            obj.entry("timestamp").or_insert_with(|| serde_json::json!(chrono::Utc::now()));
        }

        let bytes = serde_json::to_vec(&payload)
            .map_err(|e| taylordash_core::Error::internal(format!("failed to serialize publish payload: {e}")))?;

        self.bus.publish(topic, bytes, 1).await
    }
}

fn hex_preview(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len().min(256) * 2);
    for byte in bytes.iter().take(256) {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
