//! OpenAPI document for the Auth Service HTTP surface (§6 "Auth").

use crate::dto::*;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TaylorDash Auth API",
        version = "1.0.0",
        description = "Session-based authentication and user management for the TaylorDash platform."
    ),
    paths(),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            CreateUserRequest,
            UpdateUserRequest,
            ChangePasswordRequest,
            ListUsersQuery,
        )
    ),
    tags(
        (name = "auth", description = "Login, logout, and the current session"),
        (name = "users", description = "Admin-only user management"),
    ),
    security(("session_token" = []))
)]
pub struct AuthApiDoc;

pub fn session_token_scheme() -> utoipa::openapi::security::SecurityScheme {
    utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
        utoipa::openapi::security::HttpAuthScheme::Bearer,
    ))
}
