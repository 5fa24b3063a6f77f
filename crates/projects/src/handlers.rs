//! HTTP handlers for the Projects/Components/Tasks/Dependencies surface
//! (§6 "Projects").

use crate::{
    dto::{
        AddDependencyRequest, CreateComponentRequest, CreateProjectRequest, CreateTaskRequest,
        ListProjectsQuery, ListProjectsResponse, UpdateProjectRequest,
    },
    service::ProjectService,
};
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use taylordash_auth::CurrentUser;
use taylordash_core::{Pagination, Result, Role};
use uuid::Uuid;

#[derive(Clone)]
pub struct ProjectsState {
    pub service: ProjectService,
}

pub fn projects_routes() -> Router<ProjectsState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route(
            "/projects/:id/components",
            get(list_components).post(create_component),
        )
        .route("/components/:id", get(get_component).delete(delete_component))
        .route("/components/:id/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", get(get_task).delete(delete_task))
        .route(
            "/components/:id/dependencies",
            get(list_dependencies).post(add_dependency),
        )
        .route(
            "/components/:id/dependencies/:depends_on_id",
            axum::routing::delete(remove_dependency),
        )
}

async fn list_projects(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<ListProjectsResponse>> {
    taylordash_auth::require_role(&current, Role::Viewer)?;

    let pagination = Pagination {
        limit: query.limit.unwrap_or(50),
        offset: query.offset.unwrap_or(0),
    };

    let (projects, total) = state.service.list_projects(query.status.as_deref(), pagination).await?;
    Ok(Json(ListProjectsResponse { projects, total }))
}

async fn create_project(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<crate::models::Project>)> {
    taylordash_auth::require_role(&current, Role::Admin)?;
    let project = state.service.create_project(request, current.user_id).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<crate::models::Project>> {
    taylordash_auth::require_role(&current, Role::Viewer)?;
    let project = state.service.get_project(id).await?;
    Ok(Json(project))
}

async fn update_project(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProjectRequest>,
) -> Result<Json<crate::models::Project>> {
    taylordash_auth::require_role(&current, Role::Admin)?;
    let project = state.service.update_project(id, request).await?;
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    taylordash_auth::require_role(&current, Role::Admin)?;
    state.service.delete_project(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_components(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    taylordash_auth::require_role(&current, Role::Viewer)?;
    let components = state.service.list_components(project_id).await?;
    Ok(Json(serde_json::json!({ "components": components })))
}

async fn create_component(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateComponentRequest>,
) -> Result<(StatusCode, Json<crate::models::Component>)> {
    taylordash_auth::require_role(&current, Role::Admin)?;
    let component = state.service.create_component(project_id, request).await?;
    Ok((StatusCode::CREATED, Json(component)))
}

async fn get_component(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<crate::models::Component>> {
    taylordash_auth::require_role(&current, Role::Viewer)?;
    let component = state.service.get_component(id).await?;
    Ok(Json(component))
}

async fn delete_component(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    taylordash_auth::require_role(&current, Role::Admin)?;
    state.service.delete_component(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tasks(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Path(component_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    taylordash_auth::require_role(&current, Role::Viewer)?;
    let tasks = state.service.list_tasks(component_id).await?;
    Ok(Json(serde_json::json!({ "tasks": tasks })))
}

async fn create_task(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Path(component_id): Path<Uuid>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<crate::models::Task>)> {
    taylordash_auth::require_role(&current, Role::Admin)?;
    let task = state.service.create_task(component_id, request).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<crate::models::Task>> {
    taylordash_auth::require_role(&current, Role::Viewer)?;
    let task = state.service.get_task(id).await?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    taylordash_auth::require_role(&current, Role::Admin)?;
    state.service.delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_dependencies(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Path(component_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    taylordash_auth::require_role(&current, Role::Viewer)?;
    let dependencies = state.service.list_dependencies(component_id).await?;
    Ok(Json(serde_json::json!({ "dependencies": dependencies })))
}

async fn add_dependency(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Path(component_id): Path<Uuid>,
    Json(request): Json<AddDependencyRequest>,
) -> Result<(StatusCode, Json<crate::models::ComponentDependency>)> {
    taylordash_auth::require_role(&current, Role::Admin)?;
    let dependency = state.service.add_dependency(component_id, request).await?;
    Ok((StatusCode::CREATED, Json(dependency)))
}

async fn remove_dependency(
    State(state): State<ProjectsState>,
    Extension(current): Extension<CurrentUser>,
    Path((component_id, depends_on_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode> {
    taylordash_auth::require_role(&current, Role::Admin)?;
    state.service.remove_dependency(component_id, depends_on_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
