//! Project/Component/Task/ComponentDependency business logic — the domain
//! data the HTTP surface fronts (§6 "Projects").

use crate::{
    dto::{AddDependencyRequest, CreateComponentRequest, CreateProjectRequest, CreateTaskRequest, UpdateProjectRequest},
    models::{Component, ComponentDependency, Project, ProjectStatus, Task},
    repository::ProjectRepository,
};
use std::collections::{HashSet, VecDeque};
use taylordash_core::{Error, Pagination, Result};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct ProjectService {
    repository: ProjectRepository,
}

impl ProjectService {
    pub fn new(repository: ProjectRepository) -> Self {
        Self { repository }
    }

    /// `caller` is the authenticated request's user id, used whenever the
    /// request body doesn't name an explicit `owner_id` (spec.md's Project
    /// CRUD scenario test: a bare `{"name": ..., "status": ...}` POST must
    /// come back owned by the caller, not orphaned).
    pub async fn create_project(&self, request: CreateProjectRequest, caller: Uuid) -> Result<Project> {
        request.validate().map_err(|e| Error::validation(e.to_string()))?;
        self.repository
            .create(
                &request.name,
                request.description.as_deref(),
                &ProjectStatus::Active.to_string(),
                Some(request.owner_id.unwrap_or(caller)),
                &request.metadata,
            )
            .await
    }

    pub async fn get_project(&self, id: Uuid) -> Result<Project> {
        self.repository.get(id).await?.ok_or_else(|| Error::not_found("project not found"))
    }

    pub async fn list_projects(&self, status: Option<&str>, pagination: Pagination) -> Result<(Vec<Project>, i64)> {
        let pagination = pagination.clamped();
        self.repository.list(status, pagination.limit, pagination.offset).await
    }

    pub async fn update_project(&self, id: Uuid, request: UpdateProjectRequest) -> Result<Project> {
        request.validate().map_err(|e| Error::validation(e.to_string()))?;

        if let Some(status) = &request.status {
            status.parse::<ProjectStatus>()?;
        }

        self.repository
            .update(
                id,
                request.name.as_deref(),
                request.description.as_ref().map(|d| d.as_deref()),
                request.status.as_deref(),
                request.owner_id,
                request.metadata.as_ref(),
            )
            .await?
            .ok_or_else(|| Error::not_found("project not found"))
    }

    pub async fn delete_project(&self, id: Uuid) -> Result<()> {
        if !self.repository.delete(id).await? {
            return Err(Error::not_found("project not found"));
        }
        Ok(())
    }

    pub async fn create_component(&self, project_id: Uuid, request: CreateComponentRequest) -> Result<Component> {
        request.validate().map_err(|e| Error::validation(e.to_string()))?;
        self.get_project(project_id).await?;

        self.repository
            .create_component(
                project_id,
                &request.name,
                &request.component_type,
                request.status.as_deref().unwrap_or("new"),
                request.progress.clamp(0, 100),
                &request.position,
                &request.metadata,
            )
            .await
    }

    pub async fn list_components(&self, project_id: Uuid) -> Result<Vec<Component>> {
        self.repository.list_components(project_id).await
    }

    pub async fn get_component(&self, id: Uuid) -> Result<Component> {
        self.repository.get_component(id).await?.ok_or_else(|| Error::not_found("component not found"))
    }

    pub async fn delete_component(&self, id: Uuid) -> Result<()> {
        if !self.repository.delete_component(id).await? {
            return Err(Error::not_found("component not found"));
        }
        Ok(())
    }

    pub async fn create_task(&self, component_id: Uuid, request: CreateTaskRequest) -> Result<Task> {
        request.validate().map_err(|e| Error::validation(e.to_string()))?;
        self.repository
            .get_component(component_id)
            .await?
            .ok_or_else(|| Error::not_found("component not found"))?;

        self.repository
            .create_task(
                component_id,
                &request.name,
                request.description.as_deref(),
                "pending",
                request.assignee_id,
                request.due_at,
            )
            .await
    }

    pub async fn list_tasks(&self, component_id: Uuid) -> Result<Vec<Task>> {
        self.repository.list_tasks(component_id).await
    }

    pub async fn get_task(&self, id: Uuid) -> Result<Task> {
        self.repository.get_task(id).await?.ok_or_else(|| Error::not_found("task not found"))
    }

    pub async fn delete_task(&self, id: Uuid) -> Result<()> {
        if !self.repository.delete_task(id).await? {
            return Err(Error::not_found("task not found"));
        }
        Ok(())
    }

    /// Adds a dependency edge. §3 notes the storage layer enforces no
    /// acyclicity; the service layer is the caller that checks, refusing an
    /// edge that would close a cycle in the dependency DAG.
    pub async fn add_dependency(&self, component_id: Uuid, request: AddDependencyRequest) -> Result<ComponentDependency> {
        if component_id == request.depends_on_id {
            return Err(Error::validation("a component cannot depend on itself"));
        }

        let project_id = self
            .repository
            .get_component(component_id)
            .await?
            .ok_or_else(|| Error::not_found("component not found"))?
            .project_id;

        let existing = self.repository.list_dependencies(project_id).await?;
        if would_create_cycle(&existing, component_id, request.depends_on_id) {
            return Err(Error::conflict("adding this dependency would create a cycle"));
        }

        self.repository.add_dependency(component_id, request.depends_on_id).await
    }

    pub async fn list_dependencies(&self, component_id: Uuid) -> Result<Vec<ComponentDependency>> {
        let project_id = self.get_component(component_id).await?.project_id;
        let dependencies = self.repository.list_dependencies(project_id).await?;
        Ok(dependencies.into_iter().filter(|d| d.component_id == component_id).collect())
    }

    pub async fn remove_dependency(&self, component_id: Uuid, depends_on_id: Uuid) -> Result<()> {
        self.repository.remove_dependency(component_id, depends_on_id).await
    }
}

/// BFS from `depends_on_id` following existing edges; if it reaches
/// `component_id`, adding `component_id -> depends_on_id` would close a
/// cycle.
fn would_create_cycle(existing: &[ComponentDependency], component_id: Uuid, depends_on_id: Uuid) -> bool {
    let mut queue = VecDeque::from([depends_on_id]);
    let mut visited = HashSet::new();

    while let Some(current) = queue.pop_front() {
        if current == component_id {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        for edge in existing {
            if edge.component_id == current {
                queue.push_back(edge.depends_on_id);
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(a: Uuid, b: Uuid) -> ComponentDependency {
        ComponentDependency { component_id: a, depends_on_id: b }
    }

    #[test]
    fn direct_cycle_detected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let existing = vec![dep(b, a)];
        assert!(would_create_cycle(&existing, a, b));
    }

    #[test]
    fn transitive_cycle_detected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let existing = vec![dep(b, c), dep(c, a)];
        assert!(would_create_cycle(&existing, a, b));
    }

    #[test]
    fn unrelated_dependency_is_not_a_cycle() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let existing = vec![dep(b, c)];
        assert!(!would_create_cycle(&existing, a, b));
    }
}
