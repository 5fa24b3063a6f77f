//! TaylorDash platform API server.
//!
//! Wires every component crate together: the Storage Adapter (C1), Bus
//! Adapter (C2), Logging Sink (C3), Metrics Registry (C4), Auth Service
//! (C5), Event Pipeline (C6), Plugin Lifecycle (C7), HTTP Surface (C8), and
//! Health Aggregator (C9) — one process, one binary, per §5.

use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use axum::http::{HeaderName, HeaderValue, Method};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use taylordash_core::{
    BusAdapter, Config, Database, ErrorMetrics, MetricsRegistry, MetricsService, PasswordHasher,
    PlatformMetrics, SessionCleanupService, SessionStore,
};
use taylordash_core::config::CorsConfig;
use taylordash_auth::{auth_routes, AuthService};
use taylordash_events::{EventPipeline, EventRepository, DEFAULT_TOPIC_PATTERNS};
use taylordash_plugins::{PluginHealthCheckService, PluginLifecycle, PluginRepository};
use taylordash_projects::{ProjectRepository, ProjectService};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api_middleware;
mod health;
mod logs;
mod openapi;
mod state;

use crate::{
    logs::{logs_routes, LogRepository, LogsState},
    state::AppState,
};

/// How often the session cleanup task ticks. Not user-configurable today;
/// cheap enough at this interval to not warrant a config knob (§4.5). The
/// application-log retention sweep interval comes from `config.logging`.
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);
/// Plugin health checks run far more often than the hourly sweeps above —
/// §4.7 calls for auto-disable after 3 consecutive failures, which only
/// means something if failures are observed on a short cadence.
const PLUGIN_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(60);

fn build_cors_layer(cors_config: &CorsConfig) -> Result<CorsLayer, Box<dyn std::error::Error>> {
    let mut cors = CorsLayer::new();

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(tower_http::cors::Any);
    } else {
        let origins: Result<Vec<HeaderValue>, _> = cors_config.allowed_origins.iter().map(|o| o.parse()).collect();
        cors = cors.allow_origin(origins?);
    }

    if cors_config.allowed_methods.contains(&"*".to_string()) {
        cors = cors.allow_methods(tower_http::cors::Any);
    } else {
        let methods: Result<Vec<Method>, _> = cors_config.allowed_methods.iter().map(|m| m.parse()).collect();
        cors = cors.allow_methods(methods?);
    }

    if cors_config.allowed_headers.contains(&"*".to_string()) {
        cors = cors.allow_headers(tower_http::cors::Any);
    } else {
        let headers: Result<Vec<HeaderName>, _> = cors_config.allowed_headers.iter().map(|h| h.parse()).collect();
        cors = cors.allow_headers(headers?);
    }

    cors = cors.allow_credentials(cors_config.allow_credentials);

    Ok(cors)
}

async fn metrics_handler(
    axum::extract::State(metrics_service): axum::extract::State<Arc<MetricsService>>,
) -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics_service.get_metrics(),
    )
}

async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "detail": "resource not found" })))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let environment = config.app.environment.clone();

    let db = Database::connect(&config.database).await?;
    init_tracing_for(&db, &config, &environment);
    info!(environment = %environment, "taylordash-api starting");

    run_migrations(&db).await?;

    let bus = BusAdapter::connect(
        &config.bus.url,
        &config.bus.client_id,
        config.bus.credentials.as_deref(),
        Duration::from_secs(config.bus.max_reconnect_backoff_seconds),
        config.bus.worker_pool_size,
    )
    .await?;
    info!("bus adapter connected");

    let metrics_registry = MetricsRegistry::new(config.metrics.clone());
    let platform_metrics = Arc::new(PlatformMetrics::new(&metrics_registry)?);
    ErrorMetrics::new(&metrics_registry)?.install();
    let metrics_service = Arc::new(MetricsService::new(metrics_registry));

    let password_hasher = PasswordHasher::new(&config.security)?;
    let session_store = SessionStore::new(db.clone());
    let audit_logger = taylordash_core::AuditLogger::new(db.clone());
    let user_repository = taylordash_auth::UserRepository::new(db.clone());
    let auth_service = Arc::new(AuthService::new(
        user_repository,
        session_store.clone(),
        password_hasher,
        audit_logger,
        platform_metrics.clone(),
    ));

    let event_repository = EventRepository::new(db.clone());
    let event_pipeline = Arc::new(EventPipeline::new(event_repository.clone(), bus.clone(), platform_metrics.clone()));
    event_pipeline.subscribe_all(DEFAULT_TOPIC_PATTERNS).await?;
    info!(patterns = ?DEFAULT_TOPIC_PATTERNS, "event pipeline subscribed");

    let plugin_base_dir = tempfile::Builder::new().prefix("taylordash-plugins-").tempdir()?.into_path();
    let plugin_repository = PluginRepository::new(db.clone());
    let plugin_lifecycle = PluginLifecycle::new(plugin_repository.clone(), bus.clone(), plugin_base_dir);
    let plugin_health_service = PluginHealthCheckService::new(
        plugin_repository.clone(),
        plugin_lifecycle.clone(),
        bus.clone(),
        PLUGIN_HEALTH_CHECK_INTERVAL,
    );
    plugin_health_service.start();

    let project_repository = ProjectRepository::new(db.clone());
    let project_service = ProjectService::new(project_repository);

    let log_repository = LogRepository::new(db.clone());

    SessionCleanupService::new(Arc::new(session_store), SESSION_CLEANUP_INTERVAL).start();
    let retention_sweep_interval = Duration::from_secs(config.logging.retention_sweep_interval_hours * 3600);
    taylordash_core::RetentionSweeper::new(db.clone(), retention_sweep_interval).start();

    let app_state = AppState {
        db: db.clone(),
        bus: bus.clone(),
        metrics_service: metrics_service.clone(),
        platform_metrics,
        plugin_repository,
        environment: environment.clone(),
    };

    let app = build_router(config.cors.clone(), app_state, auth_service, event_pipeline, event_repository, plugin_lifecycle, project_service, log_repository, metrics_service)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!(%addr, "taylordash-api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("taylordash-api shutdown complete");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_router(
    cors_config: CorsConfig,
    app_state: AppState,
    auth_service: Arc<AuthService>,
    event_pipeline: Arc<EventPipeline>,
    event_repository: EventRepository,
    plugin_lifecycle: PluginLifecycle,
    project_service: ProjectService,
    log_repository: LogRepository,
    metrics_service: Arc<MetricsService>,
) -> Result<Router, Box<dyn std::error::Error>> {
    let events_state = taylordash_events::EventsState { repository: event_repository, pipeline: event_pipeline };
    let plugins_state = taylordash_plugins::PluginsState {
        repository: app_state.plugin_repository.clone(),
        lifecycle: plugin_lifecycle,
    };
    let projects_state = taylordash_projects::ProjectsState { service: project_service };
    let logs_state = LogsState { repository: log_repository };

    let protected_v1 = Router::new()
        .merge(taylordash_events::events_routes().with_state(events_state))
        .merge(taylordash_plugins::plugins_routes().with_state(plugins_state))
        .merge(taylordash_projects::projects_routes().with_state(projects_state))
        .merge(logs_routes().with_state(logs_state))
        .merge(health::health_stack_routes().with_state(app_state.clone()))
        .layer(axum::middleware::from_fn_with_state(
            taylordash_auth::AuthState { auth_service: auth_service.clone() },
            taylordash_auth::auth_middleware,
        ));

    let api_v1 = Router::new().nest("/auth", auth_routes(auth_service)).merge(protected_v1);

    let app = Router::new()
        .merge(health::health_routes().with_state(app_state.clone()))
        .nest("/api/v1", api_v1)
        .route("/metrics", get(metrics_handler).with_state(metrics_service))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", crate::openapi::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(api_middleware::security_headers::security_headers_middleware))
                .layer(axum::middleware::from_fn(api_middleware::request_id::request_id_middleware))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CompressionLayer::new())
                .layer(build_cors_layer(&cors_config)?),
        )
        .fallback(handler_404);

    Ok(app)
}

fn init_tracing_for(db: &Database, config: &Config, environment: &str) {
    taylordash_core::init_tracing(
        Some(db.clone()),
        config.logging.mirror_channel_capacity,
        "taylordash-api",
        environment,
        config.logging.default_retention_days,
    );
}

async fn run_migrations(db: &Database) -> Result<(), sqlx::Error> {
    info!("running database migrations");
    let migrator = sqlx::migrate!("../../migrations");
    migrator.run(db.pool()).await?;
    info!("migrations complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl+c"),
        _ = terminate => info!("received terminate signal"),
    }
}

