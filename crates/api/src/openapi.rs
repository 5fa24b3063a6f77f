//! Top-level OpenAPI document. Per-crate docs stay with their owning crate
//! (see `taylordash_auth::AuthApiDoc`); this document covers only the
//! endpoints that live in the API crate itself — health and logs — and is
//! merged with the others in `main.rs` before being served.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TaylorDash Platform API",
        version = "1.0.0",
        description = "Project tracking, event pipeline, and plugin lifecycle management."
    ),
    paths(),
    tags(
        (name = "health", description = "Liveness, readiness, and stack health"),
        (name = "logs", description = "Structured application log inspection"),
        (name = "events", description = "Event pipeline mirror and dead-letter queue"),
        (name = "plugins", description = "Plugin installation and lifecycle"),
        (name = "projects", description = "Projects, components, tasks, dependencies"),
    )
)]
pub struct ApiDoc;
