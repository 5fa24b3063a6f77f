//! Health Aggregator (C9, §6 "Health"): three endpoints at increasing
//! depth. `/health/live` never touches a dependency — it answers "is the
//! process up". `/health/ready` is the public-facing probe a load balancer
//! or orchestrator polls before routing traffic, and checks storage only
//! (§4.9). `/api/v1/health/stack` is the admin-only deep view: storage, bus,
//! and plugin-store reachability, each shaped
//! `{status, response_time_ms, details}`.

use crate::state::AppState;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::time::Instant;
use taylordash_auth::CurrentUser;
use taylordash_core::Role;

#[derive(Serialize)]
struct SubCheck {
    status: &'static str,
    response_time_ms: u128,
    details: serde_json::Value,
}

/// Pool utilization past which a healthy storage probe is still reported as
/// `degraded` rather than `healthy` — the probe succeeded but the pool is
/// close enough to exhaustion that callers should expect `resource_busy`
/// soon (§4.9 sub-check status includes a `degraded` tier for exactly this).
const POOL_DEGRADED_THRESHOLD: f64 = 0.9;

async fn timed<F, T, E>(check: F, degraded: impl FnOnce(&T) -> bool) -> SubCheck
where
    F: std::future::Future<Output = Result<T, E>>,
    T: Serialize,
    E: std::fmt::Display,
{
    let start = Instant::now();
    match check.await {
        Ok(details) => {
            let status = if degraded(&details) { "degraded" } else { "healthy" };
            SubCheck {
                status,
                response_time_ms: start.elapsed().as_millis(),
                details: serde_json::to_value(details).unwrap_or(serde_json::Value::Null),
            }
        }
        Err(err) => SubCheck {
            status: "unhealthy",
            response_time_ms: start.elapsed().as_millis(),
            details: serde_json::json!({ "error": err.to_string() }),
        },
    }
}

fn pool_degraded(status: &taylordash_core::PoolStatus) -> bool {
    status.max > 0 && (status.active as f64 / status.max as f64) >= POOL_DEGRADED_THRESHOLD
}

fn bus_check(connected: bool) -> SubCheck {
    SubCheck {
        status: if connected { "healthy" } else { "unhealthy" },
        response_time_ms: 0,
        details: serde_json::json!({ "connected": connected }),
    }
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health/live", get(live))
        .route("/health/ready", get(ready))
}

pub fn health_stack_routes() -> Router<AppState> {
    Router::new().route("/health/stack", get(stack))
}

async fn live() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "alive",
        "service": "taylordash-api",
        "timestamp": taylordash_core::Utc::now(),
    }))
}

/// §4.9: readiness depends only on the storage adapter's probe. The bus and
/// plugin store are deliberately not consulted here — a disconnected bus is
/// expected to self-heal via C2's reconnect loop and must not pull this
/// instance out of a load balancer's rotation while storage is fine.
async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let storage = timed(state.db.health(), pool_degraded).await;

    let ready = storage.status != "unhealthy";
    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(serde_json::json!({
            "ready": ready,
            "checks": {
                "storage": storage.status,
            }
        })),
    )
        .into_response()
}

/// Admin-only deep stack check. Unlike `/health/ready` this never blends the
/// sub-checks into a single boolean — callers get each component's own
/// status, timing, and details.
async fn stack(State(state): State<AppState>, Extension(current): Extension<CurrentUser>) -> Response {
    if let Err(err) = taylordash_auth::require_role(&current, Role::Admin) {
        return err.into_response();
    }

    let storage = timed(state.db.health(), pool_degraded).await;
    let bus = bus_check(state.bus.is_connected());
    let plugins = timed(async { state.plugin_repository.list(1, 0).await }, |_| false).await;

    let any_unhealthy = [storage.status, bus.status, plugins.status].contains(&"unhealthy");
    let any_degraded = [storage.status, bus.status, plugins.status].contains(&"degraded");
    let overall = if any_unhealthy {
        "unhealthy"
    } else if any_degraded {
        "degraded"
    } else {
        "healthy"
    };

    Json(serde_json::json!({
        "status": overall,
        "checks": {
            "storage": storage,
            "bus": bus,
            "plugins": plugins,
        }
    }))
    .into_response()
}
