use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use taylordash_core::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// §4.7 "Status state machine". Transitions are validated by
/// [`crate::lifecycle::PluginLifecycle`], not by this type itself — the
/// enum only names the reachable states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PluginStatus {
    Pending,
    Installing,
    Installed,
    Failed,
    Updating,
    Uninstalling,
    Disabled,
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PluginStatus::Pending => "pending",
            PluginStatus::Installing => "installing",
            PluginStatus::Installed => "installed",
            PluginStatus::Failed => "failed",
            PluginStatus::Updating => "updating",
            PluginStatus::Uninstalling => "uninstalling",
            PluginStatus::Disabled => "disabled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for PluginStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "installing" => Ok(Self::Installing),
            "installed" => Ok(Self::Installed),
            "failed" => Ok(Self::Failed),
            "updating" => Ok(Self::Updating),
            "uninstalling" => Ok(Self::Uninstalling),
            "disabled" => Ok(Self::Disabled),
            other => Err(Error::internal(format!("unknown plugin status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PluginType {
    Ui,
    Data,
    Integration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// §3 "Invariants" — weights feeding `security_score`.
    pub fn weight(self) -> i64 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 5,
            Severity::High => 15,
            Severity::Critical => 40,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(Error::internal(format!("unknown severity: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plugin {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub plugin_type: String,
    pub repository_url: String,
    pub install_path: Option<String>,
    pub manifest: serde_json::Value,
    pub permissions: Vec<String>,
    pub config: serde_json::Value,
    pub status: String,
    pub installed_at: Option<DateTime<Utc>>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub installation_id: Option<Uuid>,
    pub security_violations: i64,
    pub last_violation_at: Option<DateTime<Utc>>,
    pub security_score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plugin {
    pub fn status(&self) -> PluginStatus {
        self.status.parse().unwrap_or(PluginStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PluginInstallation {
    pub id: Uuid,
    pub plugin_id: Option<String>,
    pub status: String,
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PluginSecurityViolation {
    pub id: Uuid,
    pub plugin_id: String,
    pub violation_type: String,
    pub description: String,
    pub severity: String,
    pub context: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
    pub resolution_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PluginApiAccess {
    pub id: Uuid,
    pub plugin_id: String,
    pub endpoint: String,
    pub method: String,
    pub status_code: i32,
    pub permission_required: Option<String>,
    pub access_granted: bool,
    pub timestamp: DateTime<Utc>,
    pub response_time_ms: i64,
    pub request_data: serde_json::Value,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PluginConfigHistory {
    pub id: Uuid,
    pub plugin_id: String,
    pub old_config: serde_json::Value,
    pub new_config: serde_json::Value,
    pub changed_by: Option<Uuid>,
    pub change_reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PluginHealthCheck {
    pub id: Uuid,
    pub plugin_id: String,
    pub healthy: bool,
    pub response_time_ms: Option<i64>,
    pub detail: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// Parsed `manifest.json` from a plugin bundle (§4.7 step 4 required
/// fields).
#[derive(Debug, Clone, Deserialize)]
pub struct PluginManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    pub author: String,
    #[serde(rename = "type")]
    pub plugin_type: PluginType,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub health_endpoint: Option<String>,
}
