use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct InstallPluginRequest {
    #[validate(length(min = 1))]
    pub repository_url: String,
    #[serde(default)]
    pub requested_permissions: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InstallPluginResponse {
    pub installation_id: uuid::Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdatePluginConfigRequest {
    pub config: serde_json::Value,
    pub change_reason: Option<String>,
}
