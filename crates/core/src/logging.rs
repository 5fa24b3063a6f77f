//! Logging Sink (C3): structured logging to stdout plus a best-effort
//! mirror into the `application_logs` table.
//!
//! Every component emits through `tracing`. [`init_tracing`] wires the
//! stdout JSON layer the way the platform always has; [`DbMirrorLayer`] is a
//! second layer that forwards each event to a bounded channel so a slow or
//! unavailable database never blocks the originating request. The retention
//! sweeper (ApplicationLog-facing half of this module) prunes rows past
//! their 30-day deadline on an hourly tick.

use crate::database::Database;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationLogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub service: String,
    pub category: String,
    pub severity: String,
    pub message: String,
    pub details: Option<Value>,
    pub trace_id: Option<String>,
    pub request_id: Option<String>,
    pub user_id: Option<uuid::Uuid>,
    pub endpoint: Option<String>,
    pub method: Option<String>,
    pub status_code: Option<i32>,
    pub duration_ms: Option<i64>,
    pub error_code: Option<String>,
    pub environment: String,
    pub host: String,
}

impl ApplicationLogRecord {
    fn log_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    fn retention_deadline(&self, default_days: i64) -> DateTime<Utc> {
        self.timestamp + chrono::Duration::days(default_days)
    }
}

/// A `tracing_subscriber::Layer` that mirrors every event into a bounded
/// channel. On channel-full the record is dropped and `dropped` increments —
/// this layer must never await or block the caller's task.
pub struct DbMirrorLayer {
    sender: mpsc::Sender<ApplicationLogRecord>,
    dropped: Arc<AtomicU64>,
    service: String,
    environment: String,
    host: String,
}

struct FieldVisitor {
    message: String,
    fields: serde_json::Map<String, Value>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.insert(field.name().to_string(), Value::String(format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }
}

impl DbMirrorLayer {
    pub fn new(capacity: usize, service: impl Into<String>, environment: impl Into<String>) -> (Self, mpsc::Receiver<ApplicationLogRecord>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let host = hostname();
        (
            Self {
                sender,
                dropped: Arc::new(AtomicU64::new(0)),
                service: service.into(),
                environment: environment.into(),
                host,
            },
            receiver,
        )
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown-host".to_string())
}

impl<S: Subscriber> Layer<S> for DbMirrorLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = FieldVisitor {
            message: String::new(),
            fields: serde_json::Map::new(),
        };
        event.record(&mut visitor);

        let duration_ms = visitor
            .fields
            .get("duration_ms")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<i64>().ok());

        // Slow-operation hook (§4.3): auto-tag severity/category for any
        // operation reporting duration_ms > 1000.
        let (severity, category) = if duration_ms.map(|d| d > 1000).unwrap_or(false) {
            ("medium", "performance")
        } else {
            (severity_for_level(metadata.level()), "general")
        };

        let record = ApplicationLogRecord {
            timestamp: Utc::now(),
            level: metadata.level().to_string().to_lowercase(),
            service: self.service.clone(),
            category: category.to_string(),
            severity: severity.to_string(),
            message: visitor.message,
            details: if visitor.fields.is_empty() {
                None
            } else {
                Some(Value::Object(visitor.fields))
            },
            trace_id: None,
            request_id: None,
            user_id: None,
            endpoint: None,
            method: None,
            status_code: None,
            duration_ms,
            error_code: None,
            environment: self.environment.clone(),
            host: self.host.clone(),
        };

        if self.sender.try_send(record).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn severity_for_level(level: &tracing::Level) -> &'static str {
    match *level {
        tracing::Level::ERROR => "high",
        tracing::Level::WARN => "medium",
        tracing::Level::INFO => "low",
        _ => "info",
    }
}

/// Drains `receiver`, batching writes into `application_logs`. Runs for the
/// lifetime of the process as a background task.
pub async fn run_mirror_writer(db: Database, mut receiver: mpsc::Receiver<ApplicationLogRecord>, default_retention_days: i64) {
    while let Some(record) = receiver.recv().await {
        if let Err(err) = insert_record(&db, &record, default_retention_days).await {
            tracing::warn!(error = %err, "failed to write application log mirror record");
        }
    }
}

async fn insert_record(db: &Database, record: &ApplicationLogRecord, default_retention_days: i64) -> crate::error::Result<()> {
    let log_date = record.log_date();
    let deadline = record.retention_deadline(default_retention_days);

    sqlx::query(
        r#"
        INSERT INTO application_logs
            (id, timestamp, level, service, category, severity, message, details, trace_id,
             request_id, user_id, endpoint, method, status_code, duration_ms, error_code,
             context, environment, host, log_date, retention_deadline)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
        "#,
    )
    .bind(uuid::Uuid::new_v4())
    .bind(record.timestamp)
    .bind(&record.level)
    .bind(&record.service)
    .bind(&record.category)
    .bind(&record.severity)
    .bind(&record.message)
    .bind(&record.details)
    .bind(&record.trace_id)
    .bind(&record.request_id)
    .bind(record.user_id)
    .bind(&record.endpoint)
    .bind(&record.method)
    .bind(record.status_code)
    .bind(record.duration_ms)
    .bind(&record.error_code)
    .bind(serde_json::json!({}))
    .bind(&record.environment)
    .bind(&record.host)
    .bind(log_date)
    .bind(deadline)
    .execute(db.pool())
    .await?;

    Ok(())
}

/// Hourly sweep deleting `application_logs` rows past their retention
/// window (§4.3). The window is `default_retention_days` from each
/// record's `log_date`, stamped into `retention_deadline` at insert time.
pub struct RetentionSweeper {
    db: Database,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(db: Database, interval: Duration) -> Self {
        Self { db, interval }
    }

    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        let mut ticker = interval(self.interval);
        loop {
            ticker.tick().await;
            match self.sweep_once().await {
                Ok(deleted) if deleted > 0 => {
                    tracing::info!(deleted, "retention sweep removed expired application logs");
                }
                Ok(_) => {}
                Err(err) => tracing::error!(error = %err, "retention sweep failed"),
            }
        }
    }

    async fn sweep_once(&self) -> crate::error::Result<u64> {
        let result = sqlx::query("DELETE FROM application_logs WHERE retention_deadline < now()")
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

/// Initializes the stdout structured-logging subscriber and (if `db` is
/// provided) the `ApplicationLog` mirror layer plus its background writer
/// task.
pub fn init_tracing(db: Option<Database>, mirror_capacity: usize, service: &str, environment: &str, default_retention_days: i64) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{service}=info,tower_http=info").into());

    let fmt_layer = tracing_subscriber::fmt::layer().json();

    match db {
        Some(db) => {
            let (mirror_layer, receiver) = DbMirrorLayer::new(mirror_capacity, service, environment);
            tokio::spawn(run_mirror_writer(db, receiver, default_retention_days));

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .with(mirror_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_operation_is_tagged_performance_medium() {
        let record = ApplicationLogRecord {
            timestamp: Utc::now(),
            level: "info".to_string(),
            service: "taylordash-api".to_string(),
            category: "performance".to_string(),
            severity: "medium".to_string(),
            message: "slow query".to_string(),
            details: None,
            trace_id: None,
            request_id: None,
            user_id: None,
            endpoint: None,
            method: None,
            status_code: None,
            duration_ms: Some(1500),
            error_code: None,
            environment: "production".to_string(),
            host: "test-host".to_string(),
        };
        assert_eq!(record.category, "performance");
        assert_eq!(record.severity, "medium");
    }

    #[test]
    fn retention_deadline_defaults_to_30_days() {
        let now = Utc::now();
        let record = ApplicationLogRecord {
            timestamp: now,
            level: "info".to_string(),
            service: "svc".to_string(),
            category: "general".to_string(),
            severity: "low".to_string(),
            message: "m".to_string(),
            details: None,
            trace_id: None,
            request_id: None,
            user_id: None,
            endpoint: None,
            method: None,
            status_code: None,
            duration_ms: None,
            error_code: None,
            environment: "development".to_string(),
            host: "h".to_string(),
        };
        assert_eq!(record.retention_deadline(30), now + chrono::Duration::days(30));
    }
}
