//! HTTP handlers for the Auth Service surface (§6 "Auth").

use crate::{
    dto::{ChangePasswordRequest, CreateUserRequest, ListUsersQuery, LoginRequest, LoginResponse, UpdateUserRequest},
    middleware::{auth_middleware, require_role, AuthState},
    models::CurrentUser,
    service::AuthService,
};
use axum::{
    extract::{Extension, Path, Query, State},
    http::HeaderMap,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use std::sync::Arc;
use taylordash_core::{Pagination, Result, Role};
use uuid::Uuid;

pub type SharedAuthService = Arc<AuthService>;

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Public (login) plus session-protected (everything else) auth routes.
/// Mirrors the teacher's split between `public_routes` and
/// `protected_routes` merged under a shared middleware layer.
pub fn auth_routes(auth_service: SharedAuthService) -> Router {
    let public_routes = Router::new().route("/login", post(login));

    let protected_routes = Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/me/password", post(change_password))
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", patch(update_user).delete(delete_user))
        .layer(middleware::from_fn_with_state(
            AuthState {
                auth_service: auth_service.clone(),
            },
            auth_middleware,
        ));

    public_routes.merge(protected_routes).with_state(auth_service)
}

async fn login(
    State(service): State<SharedAuthService>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let ip = client_ip(&headers);
    let ua = user_agent(&headers);
    let (session, user) = service.login(request, ip, ua).await?;

    Ok(Json(LoginResponse {
        session_token: session.token,
        expires_at: session.expires_at,
        user,
    }))
}

async fn logout(
    State(service): State<SharedAuthService>,
    Extension(current): Extension<CurrentUser>,
) -> Result<axum::http::StatusCode> {
    service.logout(&current.session_token).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn me(Extension(current): Extension<CurrentUser>, State(service): State<SharedAuthService>) -> Result<Json<crate::models::UserResponse>> {
    let user = service.get_user(current.user_id).await?;
    Ok(Json(user))
}

async fn list_users(
    State(service): State<SharedAuthService>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<serde_json::Value>> {
    require_role(&current, Role::Admin)?;
    let pagination = Pagination {
        limit: query.limit.unwrap_or(50),
        offset: query.offset.unwrap_or(0),
    };
    let users = service.list_users(pagination).await?;
    Ok(Json(serde_json::json!({ "users": users })))
}

async fn create_user(
    State(service): State<SharedAuthService>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<crate::models::UserResponse>> {
    require_role(&current, Role::Admin)?;
    let user = service.create_user(request, current.user_id).await?;
    Ok(Json(user))
}

async fn update_user(
    State(service): State<SharedAuthService>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<crate::models::UserResponse>> {
    require_role(&current, Role::Admin)?;
    let user = service.update_user(id, request).await?;
    Ok(Json(user))
}

async fn delete_user(
    State(service): State<SharedAuthService>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<axum::http::StatusCode> {
    require_role(&current, Role::Admin)?;
    service.delete_user(id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn change_password(
    State(service): State<SharedAuthService>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<axum::http::StatusCode> {
    service.change_password(current.user_id, request).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

