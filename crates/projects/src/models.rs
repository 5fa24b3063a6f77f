use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    New,
    Active,
    Completed,
    Archived,
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProjectStatus::New => "new",
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = taylordash_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            other => Err(taylordash_core::Error::validation(format!("unknown project status: {other}"))),
        }
    }
}

/// §3 "Project". Owner reference may be null (orphan projects permitted).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub owner_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// §3 "Component". `project_id` cascade-deletes with its project.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Component {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub component_type: String,
    pub status: String,
    pub progress: i32,
    pub position: serde_json::Value,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// §3 "Task". `component_id` cascade-deletes with its component.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub component_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub assignee_id: Option<Uuid>,
    pub due_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// §3 "ComponentDependency" — composite key, forms a DAG with no enforced
/// acyclicity at the storage layer (callers must check).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ComponentDependency {
    pub component_id: Uuid,
    pub depends_on_id: Uuid,
}
