//! Authentication and user-management business logic.
//!
//! `AuthService` orchestrates password verification, session issuance,
//! authorization checks, and user CRUD, writing an audit trail for every
//! security-relevant action.

use crate::{
    dto::{ChangePasswordRequest, CreateUserRequest, LoginRequest, UpdateUserRequest},
    models::{User, UserResponse},
    repository::UserRepository,
};
use chrono::Utc;
use std::sync::Arc;
use taylordash_core::{
    audit::builders, utils::validate_password, AuditLogger, Error, PasswordHasher, PlatformMetrics,
    Result, Role, Session, SessionStore,
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

pub struct AuthService {
    users: UserRepository,
    sessions: SessionStore,
    password_hasher: PasswordHasher,
    audit: AuditLogger,
    metrics: Arc<PlatformMetrics>,
}

impl AuthService {
    pub fn new(
        users: UserRepository,
        sessions: SessionStore,
        password_hasher: PasswordHasher,
        audit: AuditLogger,
        metrics: Arc<PlatformMetrics>,
    ) -> Self {
        Self {
            users,
            sessions,
            password_hasher,
            audit,
            metrics,
        }
    }

    /// §4.5 Login. Generic failure messages guard against username
    /// enumeration; every outcome is audited regardless.
    pub async fn login(
        &self,
        request: LoginRequest,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<(Session, UserResponse)> {
        request
            .validate()
            .map_err(|e| Error::validation(e.to_string()))?;

        let user = match self.users.get_by_username(&request.username).await? {
            Some(user) if user.is_active => user,
            _ => {
                self.audit
                    .record(builders::login_failed(
                        &request.username,
                        "user not found or inactive",
                        ip_address.clone(),
                    ))
                    .await?;
                self.metrics
                    .auth_attempts_total
                    .with_label_values(&["failure", "password"])
                    .inc();
                return Err(Error::unauthenticated("invalid credentials"));
            }
        };

        if !self
            .password_hasher
            .verify_password(&request.password, &user.password_hash)?
        {
            self.audit
                .record(builders::login_failed(
                    &request.username,
                    "bad password",
                    ip_address.clone(),
                ))
                .await?;
            self.metrics
                .auth_attempts_total
                .with_label_values(&["failure", "password"])
                .inc();
            return Err(Error::unauthenticated("invalid credentials"));
        }

        let session = self
            .sessions
            .create(
                user.id,
                request.remember_me,
                ip_address.clone(),
                user_agent.clone(),
            )
            .await?;

        self.users.update_login(user.id, Utc::now()).await?;

        self.audit
            .record(
                builders::login_success(user.id)
                    .ip_address(ip_address)
                    .user_agent(user_agent),
            )
            .await?;
        self.metrics
            .auth_attempts_total
            .with_label_values(&["success", "password"])
            .inc();
        self.metrics.active_sessions.inc();

        info!(user_id = %user.id, session_id = %session.id, "login succeeded");

        Ok((session, user.into()))
    }

    /// §4.5 Validate. Callers pass the bearer/session token extracted from
    /// the request; returns the user and the (possibly extended) session.
    pub async fn validate(&self, token: &str) -> Result<(User, Session)> {
        let session = self
            .sessions
            .validate(token)
            .await?
            .ok_or_else(|| Error::unauthenticated("session not found or expired"))?;

        let user = self
            .users
            .get_by_id(session.user_id)
            .await?
            .ok_or_else(|| Error::unauthenticated("user no longer exists"))?;

        if !user.is_active {
            self.sessions.logout(token).await?;
            self.audit
                .record(builders::session_expired(user.id))
                .await?;
            return Err(Error::unauthenticated("account disabled"));
        }

        Ok((user, session))
    }

    /// §4.5 Logout.
    pub async fn logout(&self, token: &str) -> Result<()> {
        if let Some(session) = self.sessions.validate(token).await? {
            self.sessions.logout(token).await?;
            self.audit.record(builders::logout(session.user_id)).await?;
            self.metrics.active_sessions.dec();
        }
        Ok(())
    }

    pub fn authorize(&self, required: Role, actual: Role) -> Result<()> {
        taylordash_core::authorize(required, actual)
    }

    // --- User CRUD (admin-only; enforced by the caller via `authorize`) ---

    pub async fn list_users(
        &self,
        pagination: taylordash_core::Pagination,
    ) -> Result<Vec<UserResponse>> {
        let pagination = pagination.clamped();
        let users = self
            .users
            .list(pagination.limit, pagination.offset)
            .await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<UserResponse> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("user not found"))?;
        Ok(user.into())
    }

    pub async fn create_user(
        &self,
        request: CreateUserRequest,
        created_by: Uuid,
    ) -> Result<UserResponse> {
        request
            .validate()
            .map_err(|e| Error::validation(e.to_string()))?;
        validate_password(&request.password).map_err(Error::validation)?;

        if self
            .users
            .get_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(Error::conflict("username already taken"));
        }

        let password_hash = self.password_hasher.hash_password(&request.password)?;
        let user = self
            .users
            .create(
                &request.username,
                &password_hash,
                request.role,
                Some(created_by),
            )
            .await?;

        self.audit
            .record(
                builders::user_created(user.id)
                    .detail("username", user.username.clone())
                    .detail("role", request.role.to_string()),
            )
            .await?;

        Ok(user.into())
    }

    pub async fn update_user(
        &self,
        user_id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<UserResponse> {
        request
            .validate()
            .map_err(|e| Error::validation(e.to_string()))?;

        let existing = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("user not found"))?;

        if existing.role() == Role::Admin && request.role == Some(Role::Viewer) {
            let remaining_admins = self.users.count_admins(Some(user_id)).await?;
            if remaining_admins == 0 {
                return Err(Error::validation("cannot demote the last admin"));
            }
        }

        self.users
            .update_profile(
                user_id,
                request.role,
                request.default_view.map(Some),
                request.single_view_mode,
                request.is_active,
            )
            .await?;

        self.audit.record(builders::user_updated(user_id)).await?;

        self.get_user(user_id).await
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<()> {
        request
            .validate()
            .map_err(|e| Error::validation(e.to_string()))?;
        validate_password(&request.new_password).map_err(Error::validation)?;

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("user not found"))?;

        if !self
            .password_hasher
            .verify_password(&request.current_password, &user.password_hash)?
        {
            return Err(Error::unauthenticated("current password is incorrect"));
        }

        let password_hash = self.password_hasher.hash_password(&request.new_password)?;
        self.users.update_password(user_id, &password_hash).await?;
        self.audit.record(builders::password_changed(user_id)).await?;

        Ok(())
    }

    /// Deletes a user, cascading their sessions and nulling their audit
    /// event references (§3 User invariant).
    pub async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("user not found"))?;

        if user.role() == Role::Admin {
            let remaining_admins = self.users.count_admins(Some(user_id)).await?;
            if remaining_admins == 0 {
                return Err(Error::validation("cannot delete the last admin"));
            }
        }

        self.sessions.delete_for_user(user_id).await?;
        self.audit.record(builders::user_deleted(user_id)).await?;
        self.users.delete(user_id).await?;

        warn!(user_id = %user_id, "user deleted");
        Ok(())
    }
}
