//! HTTP handlers for the Event Pipeline surface (§6 "Events").

use crate::{
    dto::{ListDlqQuery, ListEventsQuery, PublishEventQuery},
    pipeline::EventPipeline,
    repository::EventRepository,
};
use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use taylordash_auth::CurrentUser;
use taylordash_core::{Pagination, Result, Role};

#[derive(Clone)]
pub struct EventsState {
    pub repository: EventRepository,
    pub pipeline: Arc<EventPipeline>,
}

pub fn events_routes() -> Router<EventsState> {
    Router::new()
        .route("/events", get(list_events))
        .route("/events/publish", post(publish_event))
        .route("/dlq", get(list_dlq))
}

async fn list_events(
    State(state): State<EventsState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<serde_json::Value>> {
    taylordash_auth::require_role(&current, Role::Admin)?;

    let pagination = Pagination {
        limit: query.limit.unwrap_or(50),
        offset: query.offset.unwrap_or(0),
    }
    .clamped();

    let events = state
        .repository
        .list(query.topic.as_deref(), query.kind.as_deref(), pagination.limit, pagination.offset)
        .await?;

    Ok(Json(serde_json::json!({ "events": events })))
}

async fn list_dlq(
    State(state): State<EventsState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListDlqQuery>,
) -> Result<Json<serde_json::Value>> {
    taylordash_auth::require_role(&current, Role::Admin)?;

    let pagination = Pagination {
        limit: query.limit.unwrap_or(50),
        offset: query.offset.unwrap_or(0),
    }
    .clamped();

    let entries = state.repository.list_dlq(pagination.limit, pagination.offset).await?;

    Ok(Json(serde_json::json!({ "dlq": entries })))
}

async fn publish_event(
    State(state): State<EventsState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<PublishEventQuery>,
    Json(payload): Json<serde_json::Value>,
) -> Result<StatusCode> {
    taylordash_auth::require_role(&current, Role::Viewer)?;

    state.pipeline.publish(&query.topic, &query.kind, payload).await?;
    Ok(StatusCode::ACCEPTED)
}
