pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod repository;
pub mod service;

pub use handlers::{auth_routes, SharedAuthService};
pub use middleware::{auth_middleware, require_role, AuthState};
pub use models::{CurrentUser, User, UserResponse};
pub use openapi::AuthApiDoc;
pub use repository::UserRepository;
pub use service::AuthService;
