use crate::models::{Component, ComponentDependency, Project, Task};
use taylordash_core::{Database, Result};
use uuid::Uuid;

#[derive(Clone)]
pub struct ProjectRepository {
    db: Database,
}

impl ProjectRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        status: &str,
        owner_id: Option<Uuid>,
        metadata: &serde_json::Value,
    ) -> Result<Project> {
        let project = sqlx::query_as::<_, Project>(
            "INSERT INTO projects (name, description, status, owner_id, metadata)
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .bind(status)
        .bind(owner_id)
        .bind(metadata)
        .fetch_one(self.db.pool())
        .await?;
        Ok(project)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(project)
    }

    pub async fn list(&self, status: Option<&str>, limit: i64, offset: i64) -> Result<(Vec<Project>, i64)> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE ($1::text IS NULL OR status = $1)
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE ($1::text IS NULL OR status = $1)")
            .bind(status)
            .fetch_one(self.db.pool())
            .await?;

        Ok((projects, total))
    }

    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<Option<&str>>,
        status: Option<&str>,
        owner_id: Option<Option<Uuid>>,
        metadata: Option<&serde_json::Value>,
    ) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(
            "UPDATE projects SET
                name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                status = COALESCE($5, status),
                owner_id = CASE WHEN $6 THEN $7 ELSE owner_id END,
                metadata = COALESCE($8, metadata),
                updated_at = now()
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(description.is_some())
        .bind(description.flatten())
        .bind(status)
        .bind(owner_id.is_some())
        .bind(owner_id.flatten())
        .bind(metadata)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(project)
    }

    /// Deletes the project; `components`, `tasks`, and
    /// `component_dependencies` cascade via foreign key constraints (§3).
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn create_component(
        &self,
        project_id: Uuid,
        name: &str,
        component_type: &str,
        status: &str,
        progress: i32,
        position: &serde_json::Value,
        metadata: &serde_json::Value,
    ) -> Result<Component> {
        let component = sqlx::query_as::<_, Component>(
            "INSERT INTO components (project_id, name, component_type, status, progress, position, metadata)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(project_id)
        .bind(name)
        .bind(component_type)
        .bind(status)
        .bind(progress)
        .bind(position)
        .bind(metadata)
        .fetch_one(self.db.pool())
        .await?;
        Ok(component)
    }

    pub async fn get_component(&self, id: Uuid) -> Result<Option<Component>> {
        let component = sqlx::query_as::<_, Component>("SELECT * FROM components WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(component)
    }

    pub async fn list_components(&self, project_id: Uuid) -> Result<Vec<Component>> {
        let components = sqlx::query_as::<_, Component>(
            "SELECT * FROM components WHERE project_id = $1 ORDER BY created_at ASC",
        )
        .bind(project_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(components)
    }

    pub async fn delete_component(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM components WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn create_task(
        &self,
        component_id: Uuid,
        name: &str,
        description: Option<&str>,
        status: &str,
        assignee_id: Option<Uuid>,
        due_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Task> {
        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (component_id, name, description, status, assignee_id, due_at)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(component_id)
        .bind(name)
        .bind(description)
        .bind(status)
        .bind(assignee_id)
        .bind(due_at)
        .fetch_one(self.db.pool())
        .await?;
        Ok(task)
    }

    pub async fn get_task(&self, id: Uuid) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(task)
    }

    pub async fn list_tasks(&self, component_id: Uuid) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE component_id = $1 ORDER BY created_at ASC",
        )
        .bind(component_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(tasks)
    }

    pub async fn delete_task(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn add_dependency(&self, component_id: Uuid, depends_on_id: Uuid) -> Result<ComponentDependency> {
        let dependency = sqlx::query_as::<_, ComponentDependency>(
            "INSERT INTO component_dependencies (component_id, depends_on_id)
             VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING *",
        )
        .bind(component_id)
        .bind(depends_on_id)
        .fetch_optional(self.db.pool())
        .await?;

        dependency.ok_or_else(|| taylordash_core::Error::conflict("dependency already exists"))
    }

    pub async fn list_dependencies(&self, project_id: Uuid) -> Result<Vec<ComponentDependency>> {
        let dependencies = sqlx::query_as::<_, ComponentDependency>(
            "SELECT cd.* FROM component_dependencies cd
             JOIN components c ON c.id = cd.component_id
             WHERE c.project_id = $1",
        )
        .bind(project_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(dependencies)
    }

    pub async fn remove_dependency(&self, component_id: Uuid, depends_on_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM component_dependencies WHERE component_id = $1 AND depends_on_id = $2")
            .bind(component_id)
            .bind(depends_on_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }
}
