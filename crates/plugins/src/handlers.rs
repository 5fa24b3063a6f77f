//! HTTP handlers for the Plugin Lifecycle surface (§6 "Plugins").

use crate::{
    dto::{InstallPluginRequest, InstallPluginResponse, UpdatePluginConfigRequest},
    lifecycle::PluginLifecycle,
    repository::PluginRepository,
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use taylordash_auth::CurrentUser;
use taylordash_core::{Error, Result, Role};
use validator::Validate;

#[derive(Clone)]
pub struct PluginsState {
    pub repository: PluginRepository,
    pub lifecycle: PluginLifecycle,
}

pub fn plugins_routes() -> Router<PluginsState> {
    Router::new()
        .route("/plugins", get(list_plugins).post(install_plugin))
        .route("/plugins/:id", get(get_plugin).delete(uninstall_plugin))
        .route("/plugins/:id/config", patch(update_config))
        .route("/plugins/:id/disable", post(disable_plugin))
        .route("/plugins/:id/enable", post(enable_plugin))
}

async fn list_plugins(State(state): State<PluginsState>) -> Result<Json<serde_json::Value>> {
    let plugins = state.repository.list(50, 0).await?;
    Ok(Json(serde_json::json!({ "plugins": plugins })))
}

async fn get_plugin(State(state): State<PluginsState>, Path(id): Path<String>) -> Result<Json<crate::models::Plugin>> {
    let plugin = state.repository.get(&id).await?.ok_or_else(|| Error::not_found("plugin not found"))?;
    Ok(Json(plugin))
}

async fn install_plugin(
    State(state): State<PluginsState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<InstallPluginRequest>,
) -> Result<(StatusCode, Json<InstallPluginResponse>)> {
    taylordash_auth::require_role(&current, Role::Admin)?;
    request.validate().map_err(|e| Error::validation(e.to_string()))?;

    let installation_id = state
        .lifecycle
        .install(&request.repository_url, &request.requested_permissions)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(InstallPluginResponse { installation_id })))
}

async fn update_config(
    State(state): State<PluginsState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePluginConfigRequest>,
) -> Result<Json<crate::models::Plugin>> {
    taylordash_auth::require_role(&current, Role::Admin)?;

    let plugin = state.repository.get(&id).await?.ok_or_else(|| Error::not_found("plugin not found"))?;

    state
        .repository
        .insert_config_history(&id, &plugin.config, &request.config, Some(current.user_id), request.change_reason.as_deref())
        .await?;
    state.repository.set_config(&id, &request.config).await?;

    let updated = state.repository.get(&id).await?.ok_or_else(|| Error::not_found("plugin not found"))?;
    Ok(Json(updated))
}

async fn disable_plugin(
    State(state): State<PluginsState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    taylordash_auth::require_role(&current, Role::Admin)?;
    state.lifecycle.disable(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn enable_plugin(
    State(state): State<PluginsState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    taylordash_auth::require_role(&current, Role::Admin)?;
    state.lifecycle.enable(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn uninstall_plugin(
    State(state): State<PluginsState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    taylordash_auth::require_role(&current, Role::Admin)?;
    state.lifecycle.uninstall(&id).await?;
    Ok(StatusCode::ACCEPTED)
}
