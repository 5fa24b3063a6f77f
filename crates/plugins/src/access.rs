//! Runtime monitoring / API proxy (§4.7.2): every plugin HTTP call is
//! recorded, and calls against an ungranted permission are rejected and
//! scored against the plugin's security posture.

use crate::models::Severity;
use crate::repository::PluginRepository;
use std::time::Instant;
use taylordash_core::{Error, Result};

#[derive(Clone)]
pub struct PluginAccessGuard {
    repository: PluginRepository,
}

impl PluginAccessGuard {
    pub fn new(repository: PluginRepository) -> Self {
        Self { repository }
    }

    /// Checks the call against the plugin's granted permissions, records a
    /// `PluginAPIAccess` row regardless of outcome, and on denial creates a
    /// `permission_denied` violation and recomputes `security_score`.
    #[allow(clippy::too_many_arguments)]
    pub async fn guard_call(
        &self,
        plugin_id: &str,
        endpoint: &str,
        method: &str,
        permission_required: Option<&str>,
        request_data: &serde_json::Value,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
        started: Instant,
    ) -> Result<()> {
        let plugin = self
            .repository
            .get(plugin_id)
            .await?
            .ok_or_else(|| Error::not_found("plugin not found"))?;

        let granted = permission_required
            .map(|p| plugin.permissions.iter().any(|g| g == p))
            .unwrap_or(true);

        let status_code = if granted { 200 } else { 403 };
        self.repository
            .record_api_access(
                plugin_id,
                endpoint,
                method,
                status_code,
                permission_required,
                granted,
                started.elapsed().as_millis() as i64,
                request_data,
                user_agent,
                ip_address,
            )
            .await?;

        if granted {
            return Ok(());
        }

        self.repository
            .insert_violation(
                plugin_id,
                "permission_denied",
                &format!("endpoint {endpoint} requires permission '{}' which was not granted", permission_required.unwrap_or("<unknown>")),
                &Severity::High.to_string(),
                &serde_json::json!({ "endpoint": endpoint, "method": method }),
            )
            .await?;

        let by_severity = self.repository.unresolved_violations_by_severity(plugin_id).await?;
        let weighted: Result<Vec<(Severity, i64)>> = by_severity
            .into_iter()
            .map(|(s, count)| s.parse::<Severity>().map(|sev| (sev, count)))
            .collect();
        let weighted = weighted?;
        let score = crate::security::compute_security_score(&weighted);
        let total: i64 = weighted.iter().map(|(_, c)| *c).sum();
        self.repository.update_security_score(plugin_id, score, total).await?;

        Err(Error::forbidden(format!("plugin '{plugin_id}' lacks permission '{}'", permission_required.unwrap_or("<unknown>"))))
    }
}
