//! Per-request authentication/authorization middleware (§4.8 steps 3-4).
//!
//! Extracts a bearer token from `Authorization` *or* a session token from
//! `X-Session-Token` (§9 "Session vs bearer token" — either is sufficient),
//! resolves it via [`AuthService::validate`], and attaches a
//! [`crate::models::CurrentUser`] to the request extensions for downstream
//! handlers and the authorization check that follows.

use crate::{models::CurrentUser, service::AuthService};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use taylordash_core::{Error, Role};

#[derive(Clone)]
pub struct AuthState {
    pub auth_service: Arc<AuthService>,
}

fn extract_token(request: &Request) -> Option<String> {
    if let Some(header) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = header.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    request
        .headers()
        .get("X-Session-Token")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Resolves the caller's session and inserts [`CurrentUser`] into the
/// request extensions. Missing/invalid tokens fail the request with 401
/// before the handler runs — no anonymous access to a protected route.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token(&request)
        .ok_or_else(|| Error::unauthenticated("missing session token"))
        .map_err(IntoResponse::into_response)?;

    let (user, session) = state
        .auth_service
        .validate(&token)
        .await
        .map_err(IntoResponse::into_response)?;

    request.extensions_mut().insert(CurrentUser {
        user_id: user.id,
        username: user.username.clone(),
        role: user.role(),
        session_id: session.id,
        session_token: token,
    });

    Ok(next.run(request).await)
}

/// Helper so a handler can enforce a minimum role after extracting
/// [`CurrentUser`] from request extensions, returning `forbidden` uniformly.
pub fn require_role(current: &CurrentUser, required: Role) -> Result<(), Error> {
    taylordash_core::authorize(required, current.role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taylordash_core::Role;

    #[test]
    fn require_role_rejects_viewer_for_admin_route() {
        let current = CurrentUser {
            user_id: uuid::Uuid::new_v4(),
            username: "viewer".to_string(),
            role: Role::Viewer,
            session_id: uuid::Uuid::new_v4(),
            session_token: "token".to_string(),
        };
        assert!(require_role(&current, Role::Admin).is_err());
    }

    #[test]
    fn require_role_allows_admin_for_viewer_route() {
        let current = CurrentUser {
            user_id: uuid::Uuid::new_v4(),
            username: "admin".to_string(),
            role: Role::Admin,
            session_id: uuid::Uuid::new_v4(),
            session_token: "token".to_string(),
        };
        assert!(require_role(&current, Role::Viewer).is_ok());
    }
}
