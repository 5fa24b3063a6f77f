pub mod dto;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use handlers::{projects_routes, ProjectsState};
pub use models::{Component, ComponentDependency, Project, ProjectStatus, Task};
pub use repository::ProjectRepository;
pub use service::ProjectService;
