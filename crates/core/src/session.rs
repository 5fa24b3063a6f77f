pub mod cleanup;

pub use cleanup::SessionCleanupService;

use crate::database::Database;
use crate::error::{Error, Result};
use crate::types::Role;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Idle window before a session needs a fresh touch, per §4.5 step 3.
const IDLE_WINDOW_STANDARD: Duration = Duration::hours(8);
const IDLE_WINDOW_REMEMBER_ME: Duration = Duration::days(30);
/// Hard cap from creation regardless of activity (§3 Session invariant).
const ABSOLUTE_TTL: Duration = Duration::days(30);

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub is_active: bool,
    /// Persisted so a later `validate()` can slide the idle window by the
    /// same rule the session was created under, without the caller having
    /// to remember and re-supply it on every request.
    pub remember_me: bool,
}

impl Session {
    pub fn is_valid(&self) -> bool {
        self.is_active && self.expires_at > Utc::now()
    }
}

/// Session store backed entirely by Postgres. There is no in-process cache:
/// every validation round-trips to the database, so a logout or account
/// deactivation takes effect on the very next request (§5 "Shared resources").
#[derive(Clone)]
pub struct SessionStore {
    db: Database,
}

impl SessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn generate_token() -> String {
        let mut bytes = [0u8; 32]; // 256 bits, well above the 128-bit floor
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        remember_me: bool,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<Session> {
        let token = Self::generate_token();
        let now = Utc::now();
        let idle_window = if remember_me {
            IDLE_WINDOW_REMEMBER_ME
        } else {
            IDLE_WINDOW_STANDARD
        };
        let expires_at = now + idle_window;

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, token, created_at, expires_at, last_activity_at, ip_address, user_agent, is_active, remember_me)
            VALUES ($1, $2, $3, $4, $5, $4, $6, $7, true, $8)
            RETURNING id, user_id, token, created_at, expires_at, last_activity_at, ip_address, user_agent, is_active, remember_me
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&token)
        .bind(now)
        .bind(expires_at)
        .bind(ip_address)
        .bind(user_agent)
        .bind(remember_me)
        .fetch_one(self.db.pool())
        .await?;

        Ok(session)
    }

    /// Looks up a session by token, touching `last_activity_at` and sliding
    /// `expires_at` forward when still valid. Returns `None` when the token
    /// does not resolve to an active, unexpired session.
    pub async fn validate(&self, token: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, token, created_at, expires_at, last_activity_at, ip_address, user_agent, is_active, remember_me
            FROM sessions WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(self.db.pool())
        .await?;

        let Some(session) = session else {
            return Ok(None);
        };

        if !session.is_valid() {
            return Ok(None);
        }

        let idle_window = if session.remember_me {
            IDLE_WINDOW_REMEMBER_ME
        } else {
            IDLE_WINDOW_STANDARD
        };
        let now = Utc::now();
        let new_expiry = std::cmp::min(now + idle_window, session.created_at + ABSOLUTE_TTL);

        let touched = sqlx::query_as::<_, Session>(
            r#"
            UPDATE sessions SET last_activity_at = $2, expires_at = $3
            WHERE id = $1
            RETURNING id, user_id, token, created_at, expires_at, last_activity_at, ip_address, user_agent, is_active, remember_me
            "#,
        )
        .bind(session.id)
        .bind(now)
        .bind(new_expiry)
        .fetch_one(self.db.pool())
        .await?;

        Ok(Some(touched))
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        sqlx::query("UPDATE sessions SET is_active = false WHERE token = $1")
            .bind(token)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Deletes every session belonging to a user, used when a user is deleted.
    pub async fn delete_for_user(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Marks every session with `expires_at <= now` as inactive. Run hourly
    /// by [`SessionCleanupService`].
    pub async fn mark_expired_inactive(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET is_active = false WHERE is_active = true AND expires_at <= now()",
        )
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_active(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sessions WHERE is_active = true AND expires_at > now()",
        )
        .fetch_one(self.db.pool())
        .await?;
        Ok(count.0)
    }
}

/// Resolves the minimum role an endpoint requires against a caller's role.
/// `viewer < admin`; admin-only endpoints reject viewers with "forbidden".
pub fn authorize(required: Role, actual: Role) -> Result<()> {
    if actual >= required {
        Ok(())
    } else {
        Err(Error::forbidden("insufficient role for this operation"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_satisfies_viewer_requirement() {
        assert!(authorize(Role::Viewer, Role::Admin).is_ok());
    }

    #[test]
    fn viewer_rejected_from_admin_endpoint() {
        assert!(authorize(Role::Admin, Role::Viewer).is_err());
    }

    #[test]
    fn session_invalid_once_inactive() {
        let session = Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token: "t".to_string(),
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::hours(1),
            last_activity_at: Utc::now(),
            ip_address: None,
            user_agent: None,
            is_active: false,
            remember_me: false,
        };
        assert!(!session.is_valid());
    }

    #[test]
    fn session_invalid_once_expired() {
        let session = Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token: "t".to_string(),
            created_at: Utc::now() - Duration::hours(2),
            expires_at: Utc::now() - Duration::minutes(1),
            last_activity_at: Utc::now() - Duration::hours(1),
            ip_address: None,
            user_agent: None,
            is_active: true,
            remember_me: false,
        };
        assert!(!session.is_valid());
    }
}
