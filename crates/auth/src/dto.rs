//! Request/response bodies for the Auth Service HTTP surface (§6 "Auth").

use serde::{Deserialize, Serialize};
use taylordash_core::Role;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub session_token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub user: crate::models::UserResponse,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    pub role: Option<Role>,
    pub default_view: Option<String>,
    pub single_view_mode: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListUsersQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Path parameter helper so handlers can destructure `{id}` without an
/// extra import at every call site.
#[derive(Debug, Deserialize)]
pub struct UserIdPath {
    pub id: Uuid,
}
