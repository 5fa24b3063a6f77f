use crate::models::User;
use chrono::{DateTime, Utc};
use taylordash_core::{Database, Result, Role};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        created_by: Option<Uuid>,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash, role, created_by)
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(username)
        .bind(password_hash)
        .bind(role.to_string())
        .bind(created_by)
        .fetch_one(self.db.pool())
        .await?;

        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(user)
    }

    pub async fn get_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(user)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        Ok(users)
    }

    pub async fn count_admins(&self, exclude: Option<Uuid>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE role = 'admin' AND is_active AND id != COALESCE($1, '00000000-0000-0000-0000-000000000000')",
        )
        .bind(exclude)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    pub async fn update_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(user_id)
            .bind(at)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    pub async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        role: Option<Role>,
        default_view: Option<Option<String>>,
        single_view_mode: Option<bool>,
        is_active: Option<bool>,
    ) -> Result<()> {
        if let Some(role) = role {
            sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
                .bind(user_id)
                .bind(role.to_string())
                .execute(self.db.pool())
                .await?;
        }
        if let Some(default_view) = default_view {
            sqlx::query("UPDATE users SET default_view = $2 WHERE id = $1")
                .bind(user_id)
                .bind(default_view)
                .execute(self.db.pool())
                .await?;
        }
        if let Some(single_view_mode) = single_view_mode {
            sqlx::query("UPDATE users SET single_view_mode = $2 WHERE id = $1")
                .bind(user_id)
                .bind(single_view_mode)
                .execute(self.db.pool())
                .await?;
        }
        if let Some(is_active) = is_active {
            sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
                .bind(user_id)
                .bind(is_active)
                .execute(self.db.pool())
                .await?;
        }

        Ok(())
    }

    /// Hard-deletes the user. Callers are responsible for cascading session
    /// deletion and nulling audit event references beforehand (see
    /// `AuthService::delete_user`).
    pub async fn delete(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}
