use crate::models::{
    Plugin, PluginApiAccess, PluginConfigHistory, PluginHealthCheck, PluginInstallation,
    PluginSecurityViolation,
};
use taylordash_core::{Database, Result};
use uuid::Uuid;

#[derive(Clone)]
pub struct PluginRepository {
    db: Database,
}

impl PluginRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Plugin>> {
        let plugin = sqlx::query_as::<_, Plugin>("SELECT * FROM plugins WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(plugin)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Plugin>> {
        let plugins = sqlx::query_as::<_, Plugin>(
            "SELECT * FROM plugins ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;
        Ok(plugins)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn upsert(
        &self,
        id: &str,
        name: &str,
        version: &str,
        description: Option<&str>,
        author: Option<&str>,
        plugin_type: &str,
        repository_url: &str,
        install_path: Option<&str>,
        manifest: &serde_json::Value,
        permissions: &[String],
        status: &str,
        installation_id: Option<Uuid>,
    ) -> Result<Plugin> {
        let plugin = sqlx::query_as::<_, Plugin>(
            "INSERT INTO plugins
                (id, name, version, description, author, plugin_type, repository_url,
                 install_path, manifest, permissions, config, status, installed_at,
                 installation_id, security_violations, security_score)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, '{}'::jsonb, $11, now(), $12, 0, 100)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                version = EXCLUDED.version,
                description = EXCLUDED.description,
                author = EXCLUDED.author,
                plugin_type = EXCLUDED.plugin_type,
                repository_url = EXCLUDED.repository_url,
                install_path = EXCLUDED.install_path,
                manifest = EXCLUDED.manifest,
                permissions = EXCLUDED.permissions,
                status = EXCLUDED.status,
                installation_id = EXCLUDED.installation_id,
                last_updated_at = now(),
                updated_at = now()
             RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(version)
        .bind(description)
        .bind(author)
        .bind(plugin_type)
        .bind(repository_url)
        .bind(install_path)
        .bind(manifest)
        .bind(permissions)
        .bind(status)
        .bind(installation_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(plugin)
    }

    pub async fn set_status(&self, id: &str, status: &str) -> Result<()> {
        sqlx::query("UPDATE plugins SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    pub async fn set_config(&self, id: &str, config: &serde_json::Value) -> Result<()> {
        sqlx::query("UPDATE plugins SET config = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(config)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM plugins WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// `plugin_id` is `None` for a brand-new install: the plugin id only
    /// becomes known once the manifest is parsed, at which point
    /// [`Self::set_installation_plugin_id`] links the two rows.
    pub async fn create_installation(&self, plugin_id: Option<&str>) -> Result<PluginInstallation> {
        let installation = sqlx::query_as::<_, PluginInstallation>(
            "INSERT INTO plugin_installations (plugin_id, status, started_at, updated_at)
             VALUES ($1, 'pending', now(), now()) RETURNING *",
        )
        .bind(plugin_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(installation)
    }

    pub async fn set_installation_plugin_id(&self, id: Uuid, plugin_id: &str) -> Result<()> {
        sqlx::query("UPDATE plugin_installations SET plugin_id = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(plugin_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    pub async fn update_installation(
        &self,
        id: Uuid,
        status: &str,
        message: Option<&str>,
        error_details: Option<&str>,
        completed: bool,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE plugin_installations
             SET status = $2, message = $3, error_details = $4, updated_at = now(),
                 completed_at = CASE WHEN $5 THEN now() ELSE completed_at END
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(message)
        .bind(error_details)
        .bind(completed)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn insert_violation(
        &self,
        plugin_id: &str,
        violation_type: &str,
        description: &str,
        severity: &str,
        context: &serde_json::Value,
    ) -> Result<PluginSecurityViolation> {
        let violation = sqlx::query_as::<_, PluginSecurityViolation>(
            "INSERT INTO plugin_security_violations
                (plugin_id, violation_type, description, severity, context, timestamp, resolved)
             VALUES ($1, $2, $3, $4, $5, now(), false) RETURNING *",
        )
        .bind(plugin_id)
        .bind(violation_type)
        .bind(description)
        .bind(severity)
        .bind(context)
        .fetch_one(self.db.pool())
        .await?;
        Ok(violation)
    }

    pub async fn unresolved_violations_by_severity(&self, plugin_id: &str) -> Result<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT severity, COUNT(*) FROM plugin_security_violations
             WHERE plugin_id = $1 AND NOT resolved GROUP BY severity",
        )
        .bind(plugin_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    pub async fn list_violations(&self, plugin_id: &str) -> Result<Vec<PluginSecurityViolation>> {
        let violations = sqlx::query_as::<_, PluginSecurityViolation>(
            "SELECT * FROM plugin_security_violations WHERE plugin_id = $1 ORDER BY timestamp DESC",
        )
        .bind(plugin_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(violations)
    }

    pub async fn update_security_score(&self, plugin_id: &str, score: i32, violation_count: i64) -> Result<()> {
        sqlx::query(
            "UPDATE plugins SET security_score = $2, security_violations = $3,
                last_violation_at = now(), updated_at = now() WHERE id = $1",
        )
        .bind(plugin_id)
        .bind(score)
        .bind(violation_count)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn record_api_access(
        &self,
        plugin_id: &str,
        endpoint: &str,
        method: &str,
        status_code: i32,
        permission_required: Option<&str>,
        access_granted: bool,
        response_time_ms: i64,
        request_data: &serde_json::Value,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<PluginApiAccess> {
        let access = sqlx::query_as::<_, PluginApiAccess>(
            "INSERT INTO plugin_api_access
                (plugin_id, endpoint, method, status_code, permission_required, access_granted,
                 timestamp, response_time_ms, request_data, user_agent, ip_address)
             VALUES ($1, $2, $3, $4, $5, $6, now(), $7, $8, $9, $10) RETURNING *",
        )
        .bind(plugin_id)
        .bind(endpoint)
        .bind(method)
        .bind(status_code)
        .bind(permission_required)
        .bind(access_granted)
        .bind(response_time_ms)
        .bind(request_data)
        .bind(user_agent)
        .bind(ip_address)
        .fetch_one(self.db.pool())
        .await?;
        Ok(access)
    }

    pub async fn insert_config_history(
        &self,
        plugin_id: &str,
        old_config: &serde_json::Value,
        new_config: &serde_json::Value,
        changed_by: Option<Uuid>,
        change_reason: Option<&str>,
    ) -> Result<PluginConfigHistory> {
        let entry = sqlx::query_as::<_, PluginConfigHistory>(
            "INSERT INTO plugin_config_history
                (plugin_id, old_config, new_config, changed_by, change_reason, timestamp)
             VALUES ($1, $2, $3, $4, $5, now()) RETURNING *",
        )
        .bind(plugin_id)
        .bind(old_config)
        .bind(new_config)
        .bind(changed_by)
        .bind(change_reason)
        .fetch_one(self.db.pool())
        .await?;
        Ok(entry)
    }

    pub async fn insert_health_check(
        &self,
        plugin_id: &str,
        healthy: bool,
        response_time_ms: Option<i64>,
        detail: Option<&str>,
    ) -> Result<PluginHealthCheck> {
        let check = sqlx::query_as::<_, PluginHealthCheck>(
            "INSERT INTO plugin_health_checks (plugin_id, healthy, response_time_ms, detail, checked_at)
             VALUES ($1, $2, $3, $4, now()) RETURNING *",
        )
        .bind(plugin_id)
        .bind(healthy)
        .bind(response_time_ms)
        .bind(detail)
        .fetch_one(self.db.pool())
        .await?;
        Ok(check)
    }

    /// Count of consecutive failures since the last `true`, used by the
    /// health-check task to decide whether to auto-disable (§4.7.4).
    pub async fn consecutive_health_failures(&self, plugin_id: &str) -> Result<i64> {
        let rows: Vec<(bool,)> = sqlx::query_as(
            "SELECT healthy FROM plugin_health_checks WHERE plugin_id = $1
             ORDER BY checked_at DESC LIMIT 3",
        )
        .bind(plugin_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut count = 0;
        for (healthy,) in rows {
            if healthy {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    pub async fn installed_plugins_with_health_endpoint(&self) -> Result<Vec<Plugin>> {
        let plugins = sqlx::query_as::<_, Plugin>(
            "SELECT * FROM plugins WHERE status = 'installed'
             AND manifest ? 'health_endpoint' AND manifest->>'health_endpoint' IS NOT NULL",
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(plugins)
    }

}
