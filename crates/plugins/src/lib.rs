pub mod access;
pub mod dto;
pub mod handlers;
pub mod health;
pub mod lifecycle;
pub mod models;
pub mod repository;
pub mod security;

pub use access::PluginAccessGuard;
pub use handlers::{plugins_routes, PluginsState};
pub use health::PluginHealthCheckService;
pub use lifecycle::PluginLifecycle;
pub use models::{Plugin, PluginStatus, PluginType, Severity};
pub use repository::PluginRepository;
