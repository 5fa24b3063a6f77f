//! Read-side HTTP surface over the `application_logs` table the Logging
//! Sink (C3, `taylordash_core::logging`) writes to. No domain crate owns
//! this table, so the repository lives here rather than in core — the
//! writer half stays in `taylordash_core::logging`, this is purely the
//! admin-facing query half (§6 "Logs").

use axum::{
    extract::{Extension, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::FromRow;
use taylordash_auth::CurrentUser;
use taylordash_core::{Pagination, Result, Role};
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct LogRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub service: String,
    pub category: String,
    pub severity: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub trace_id: Option<String>,
    pub request_id: Option<String>,
    pub user_id: Option<Uuid>,
    pub endpoint: Option<String>,
    pub method: Option<String>,
    pub status_code: Option<i32>,
    pub duration_ms: Option<i64>,
    pub error_code: Option<String>,
    pub environment: String,
    pub host: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListLogsQuery {
    pub level: Option<String>,
    pub service: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LogStatsQuery {
    pub hours: Option<i64>,
}

#[derive(Clone)]
pub struct LogRepository {
    db: taylordash_core::Database,
}

impl LogRepository {
    pub fn new(db: taylordash_core::Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: &ListLogsQuery, pagination: Pagination) -> Result<Vec<LogRecord>> {
        let records = sqlx::query_as::<_, LogRecord>(
            r#"
            SELECT id, timestamp, level, service, category, severity, message, details, trace_id,
                   request_id, user_id, endpoint, method, status_code, duration_ms, error_code,
                   environment, host
            FROM application_logs
            WHERE ($1::text IS NULL OR level = $1)
              AND ($2::text IS NULL OR service = $2)
              AND ($3::text IS NULL OR category = $3)
              AND ($4::text IS NULL OR message ILIKE '%' || $4 || '%')
              AND ($5::timestamptz IS NULL OR timestamp >= $5)
              AND ($6::timestamptz IS NULL OR timestamp <= $6)
            ORDER BY timestamp DESC
            LIMIT $7 OFFSET $8
            "#,
        )
        .bind(&query.level)
        .bind(&query.service)
        .bind(&query.category)
        .bind(&query.search)
        .bind(query.start)
        .bind(query.end)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(self.db.pool())
        .await?;

        Ok(records)
    }

    /// Aggregates over the trailing `since_hours` window: total count plus a
    /// per-level breakdown, mirroring the kind of rollup an operator dashboard
    /// would chart.
    pub async fn stats(&self, since_hours: i64) -> Result<LogStats> {
        let since = Utc::now() - chrono::Duration::hours(since_hours);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM application_logs WHERE timestamp >= $1")
            .bind(since)
            .fetch_one(self.db.pool())
            .await?;

        let by_level: Vec<(String, i64)> = sqlx::query_as(
            "SELECT level, COUNT(*) FROM application_logs WHERE timestamp >= $1 GROUP BY level",
        )
        .bind(since)
        .fetch_all(self.db.pool())
        .await?;

        let by_service: Vec<(String, i64)> = sqlx::query_as(
            "SELECT service, COUNT(*) FROM application_logs WHERE timestamp >= $1 GROUP BY service",
        )
        .bind(since)
        .fetch_all(self.db.pool())
        .await?;

        Ok(LogStats { since_hours, total, by_level, by_service })
    }
}

#[derive(Debug, serde::Serialize)]
pub struct LogStats {
    pub since_hours: i64,
    pub total: i64,
    pub by_level: Vec<(String, i64)>,
    pub by_service: Vec<(String, i64)>,
}

#[derive(Clone)]
pub struct LogsState {
    pub repository: LogRepository,
}

pub fn logs_routes() -> Router<LogsState> {
    Router::new()
        .route("/logs", get(list_logs))
        .route("/logs/stats", get(log_stats))
}

async fn list_logs(
    State(state): State<LogsState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListLogsQuery>,
) -> Result<Json<serde_json::Value>> {
    taylordash_auth::require_role(&current, Role::Admin)?;

    let pagination = Pagination {
        limit: query.limit.unwrap_or(50),
        offset: query.offset.unwrap_or(0),
    }
    .clamped();

    let logs = state.repository.list(&query, pagination).await?;
    Ok(Json(serde_json::json!({ "logs": logs })))
}

async fn log_stats(
    State(state): State<LogsState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<LogStatsQuery>,
) -> Result<Json<LogStats>> {
    taylordash_auth::require_role(&current, Role::Admin)?;
    let stats = state.repository.stats(query.hours.unwrap_or(24)).await?;
    Ok(Json(stats))
}
