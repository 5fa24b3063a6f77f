//! Plugin Lifecycle (C7): install flow, status state machine (§4.7),
//! configuration history, and the security-score arithmetic the static
//! analyzer feeds.

use crate::models::{Plugin, PluginManifest, PluginStatus};
use crate::repository::PluginRepository;
use crate::security::{self, KNOWN_PERMISSIONS};
use std::path::{Path, PathBuf};
use taylordash_core::{BusAdapter, Error, Result};
use tracing::{info, warn};
use uuid::Uuid;

/// Allow-listed git hosts (§4.7 step 2). A real deployment would make this
/// configurable; the list here matches the hosts the platform's own plugin
/// examples are published under.
const ALLOWED_HOSTS: &[&str] = &["github.com", "gitlab.com", "bitbucket.org"];

/// §4.7 "Status state machine": the only transitions this lifecycle accepts.
fn valid_transition(from: PluginStatus, to: PluginStatus) -> bool {
    use PluginStatus::*;
    matches!(
        (from, to),
        (Pending, Installing)
            | (Installing, Installed)
            | (Pending, Failed)
            | (Installing, Failed)
            | (Installed, Updating)
            | (Updating, Installed)
            | (Updating, Failed)
            | (Installed, Uninstalling)
            | (Installed, Disabled)
            | (Disabled, Installed)
    )
}

fn validate_repository_url(url: &str) -> Result<()> {
    let host = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("git@")
        .split(['/', ':'])
        .next()
        .unwrap_or("");

    if ALLOWED_HOSTS.contains(&host) {
        Ok(())
    } else {
        Err(Error::validation(format!("repository host '{host}' is not on the allow-list")))
    }
}

#[derive(Clone)]
pub struct PluginLifecycle {
    repository: PluginRepository,
    bus: BusAdapter,
    base_dir: PathBuf,
}

impl PluginLifecycle {
    pub fn new(repository: PluginRepository, bus: BusAdapter, base_dir: PathBuf) -> Self {
        Self {
            repository,
            bus,
            base_dir,
        }
    }

    /// §4.7 "Install flow". Returns the `installation_id` immediately after
    /// recording the attempt; the remaining steps run against the same
    /// record so `GET /plugins/{id}` reflects progress.
    pub async fn install(&self, repository_url: &str, requested_permissions: &[String]) -> Result<Uuid> {
        let installation = self.repository.create_installation(None).await?;
        let installation_id = installation.id;

        if let Err(err) = validate_repository_url(repository_url) {
            self.repository
                .update_installation(installation_id, "failed", Some(&err.message), None, true)
                .await?;
            return Err(err);
        }

        self.repository
            .update_installation(installation_id, "installing", None, None, false)
            .await?;

        match self.fetch_and_validate(repository_url, requested_permissions, installation_id).await {
            Ok(plugin_id) => {
                self.repository
                    .update_installation(installation_id, "installed", None, None, true)
                    .await?;
                self.emit_event("plugins/events/installed", &plugin_id).await;
            }
            Err(err) => {
                self.repository
                    .update_installation(installation_id, "failed", Some(&err.message), Some(&err.message), true)
                    .await?;
            }
        }

        Ok(installation_id)
    }

    async fn fetch_and_validate(
        &self,
        repository_url: &str,
        requested_permissions: &[String],
        installation_id: Uuid,
    ) -> Result<String> {
        let clone_dir = self.base_dir.join(format!("install-{installation_id}"));
        let clone_dir_clone = clone_dir.clone();
        let repository_url_owned = repository_url.to_string();

        tokio::task::spawn_blocking(move || git2::Repository::clone(&repository_url_owned, &clone_dir_clone))
            .await
            .map_err(|e| Error::internal(format!("clone task panicked: {e}")))?
            .map_err(|e| Error::upstream_failure(format!("failed to clone plugin repository: {e}")))?;

        let manifest = self.parse_manifest(&clone_dir)?;
        self.repository
            .set_installation_plugin_id(installation_id, &manifest.id)
            .await?;

        for permission in &manifest.permissions {
            if !KNOWN_PERMISSIONS.contains(&permission.as_str()) {
                return Err(Error::validation(format!("unknown permission '{permission}' in manifest")));
            }
        }

        let declared_origins: Vec<String> = Vec::new();
        let mut findings = security::scan_bundle(&clone_dir, &declared_origins);
        findings.extend(security::scan_permissions(&manifest.permissions));

        let has_critical = findings.iter().any(|f| f.severity == crate::models::Severity::Critical);

        for finding in &findings {
            self.repository
                .insert_violation(
                    &manifest.id,
                    finding.violation_type,
                    &finding.description,
                    &finding.severity.to_string(),
                    &serde_json::json!({ "file": finding.file, "line": finding.line }),
                )
                .await?;
        }

        // §3 invariant: `security_score` reflects the plugin's total unresolved
        // burden, not just this scan's findings — on a re-scan (`update()`),
        // violations from earlier scans that are still unresolved must keep
        // counting. Same query+compute shape as `access.rs::guard_call`.
        let by_severity = self.repository.unresolved_violations_by_severity(&manifest.id).await?;
        let weighted: Vec<(crate::models::Severity, i64)> = by_severity
            .into_iter()
            .map(|(s, count)| s.parse::<crate::models::Severity>().map(|sev| (sev, count)))
            .collect::<Result<Vec<_>>>()?;
        let score = security::compute_security_score(&weighted);
        let total_unresolved: i64 = weighted.iter().map(|(_, c)| *c).sum();

        if has_critical || score < 50 {
            self.repository
                .upsert(
                    &manifest.id,
                    &manifest.name,
                    &manifest.version,
                    manifest.description.as_deref(),
                    Some(&manifest.author),
                    &plugin_type_str(manifest.plugin_type),
                    repository_url,
                    None,
                    &serde_json::json!({ "health_endpoint": manifest.health_endpoint }),
                    &manifest.permissions,
                    "failed",
                    Some(installation_id),
                )
                .await?;
            self.repository
                .update_security_score(&manifest.id, score, total_unresolved)
                .await?;
            return Err(Error::conflict(format!(
                "plugin '{}' failed static security analysis (score {score}, critical findings present: {has_critical})",
                manifest.id
            )));
        }

        let granted_permissions: Vec<String> = requested_permissions
            .iter()
            .filter(|p| manifest.permissions.contains(p) && KNOWN_PERMISSIONS.contains(&p.as_str()))
            .cloned()
            .collect();

        let install_path = clone_dir.to_string_lossy().to_string();

        self.repository
            .upsert(
                &manifest.id,
                &manifest.name,
                &manifest.version,
                manifest.description.as_deref(),
                Some(&manifest.author),
                &plugin_type_str(manifest.plugin_type),
                repository_url,
                Some(&install_path),
                &serde_json::json!({ "health_endpoint": manifest.health_endpoint }),
                &granted_permissions,
                "installed",
                Some(installation_id),
            )
            .await?;
        self.repository
            .update_security_score(&manifest.id, score, total_unresolved)
            .await?;

        info!(plugin_id = %manifest.id, score, "plugin installed");
        Ok(manifest.id)
    }

    fn parse_manifest(&self, bundle_dir: &Path) -> Result<PluginManifest> {
        let manifest_path = bundle_dir.join("manifest.json");
        let contents = std::fs::read_to_string(&manifest_path)
            .map_err(|e| Error::validation(format!("missing or unreadable manifest.json: {e}")))?;
        serde_json::from_str(&contents).map_err(|e| Error::validation(format!("invalid manifest.json: {e}")))
    }

    /// §4.7 "Installation is monotonic": a new install for an existing
    /// plugin id becomes an `updating` transition; failure reverts to the
    /// prior `installed` state without touching the existing row's config.
    pub async fn update(&self, plugin_id: &str, repository_url: &str, requested_permissions: &[String]) -> Result<Uuid> {
        let existing = self
            .repository
            .get(plugin_id)
            .await?
            .ok_or_else(|| Error::not_found("plugin not found"))?;

        self.transition(&existing, PluginStatus::Updating).await?;

        let installation = self.repository.create_installation(Some(plugin_id)).await?;
        match self.fetch_and_validate(repository_url, requested_permissions, installation.id).await {
            Ok(_) => {
                self.repository
                    .update_installation(installation.id, "installed", None, None, true)
                    .await?;
            }
            Err(err) => {
                self.repository.set_status(plugin_id, "installed").await?;
                self.repository
                    .update_installation(installation.id, "failed", Some(&err.message), Some(&err.message), true)
                    .await?;
                return Err(err);
            }
        }
        Ok(installation.id)
    }

    pub async fn disable(&self, plugin_id: &str) -> Result<()> {
        let plugin = self.repository.get(plugin_id).await?.ok_or_else(|| Error::not_found("plugin not found"))?;
        self.transition(&plugin, PluginStatus::Disabled).await
    }

    pub async fn enable(&self, plugin_id: &str) -> Result<()> {
        let plugin = self.repository.get(plugin_id).await?.ok_or_else(|| Error::not_found("plugin not found"))?;
        self.transition(&plugin, PluginStatus::Installed).await
    }

    pub async fn uninstall(&self, plugin_id: &str) -> Result<()> {
        let plugin = self.repository.get(plugin_id).await?.ok_or_else(|| Error::not_found("plugin not found"))?;
        self.transition(&plugin, PluginStatus::Uninstalling).await?;
        self.repository.delete(plugin_id).await?;
        self.emit_event("plugins/events/uninstalled", plugin_id).await;
        Ok(())
    }

    async fn transition(&self, plugin: &Plugin, to: PluginStatus) -> Result<()> {
        let from = plugin.status();
        if !valid_transition(from, to) {
            return Err(Error::conflict(format!("invalid plugin status transition {from} -> {to}")));
        }
        self.repository.set_status(&plugin.id, &to.to_string()).await
    }

    async fn emit_event(&self, topic: &str, plugin_id: &str) {
        let payload = serde_json::json!({
            "trace_id": Uuid::new_v4(),
            "event_type": topic.rsplit('/').next().unwrap_or("plugin"),
            "timestamp": chrono::Utc::now(),
            "source": "taylordash-plugins",
            "version": "1.0.0",
            "data": { "plugin_id": plugin_id },
        });
        if let Ok(bytes) = serde_json::to_vec(&payload) {
            if let Err(err) = self.bus.publish(topic, bytes, 1).await {
                warn!(topic, plugin_id, error = %err, "failed to emit plugin lifecycle event");
            }
        }
    }
}

fn plugin_type_str(plugin_type: crate::models::PluginType) -> String {
    match plugin_type {
        crate::models::PluginType::Ui => "ui",
        crate::models::PluginType::Data => "data",
        crate::models::PluginType::Integration => "integration",
        crate::models::PluginType::System => "system",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_known_host() {
        assert!(validate_repository_url("https://github.com/acme/plugin.git").is_ok());
    }

    #[test]
    fn rejects_unknown_host() {
        assert!(validate_repository_url("https://evil.example.com/acme/plugin.git").is_err());
    }

    #[test]
    fn state_machine_rejects_skip_from_pending_to_installed() {
        assert!(!valid_transition(PluginStatus::Pending, PluginStatus::Installed));
    }

    #[test]
    fn state_machine_allows_disabled_roundtrip() {
        assert!(valid_transition(PluginStatus::Installed, PluginStatus::Disabled));
        assert!(valid_transition(PluginStatus::Disabled, PluginStatus::Installed));
    }
}
