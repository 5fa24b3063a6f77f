//! Shared process state handed to every sub-router via `.with_state(...)`.
//!
//! Unlike the teacher's single `AppState` that every handler closed over
//! directly, each domain crate (`taylordash-events`, `taylordash-plugins`,
//! `taylordash-projects`) owns its own state struct; [`AppState`] here only
//! holds what the API crate itself needs — building those sub-states, the
//! Health Aggregator's (§6 "Health") cross-cutting dependency checks, and
//! the request-metrics middleware.

use std::sync::Arc;
use taylordash_core::{BusAdapter, Database, MetricsService, PlatformMetrics};
use taylordash_plugins::PluginRepository;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub bus: BusAdapter,
    pub metrics_service: Arc<MetricsService>,
    pub platform_metrics: Arc<PlatformMetrics>,
    pub plugin_repository: PluginRepository,
    pub environment: String,
}
