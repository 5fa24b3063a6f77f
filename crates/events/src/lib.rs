pub mod dedup;
pub mod dto;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod repository;

pub use handlers::{events_routes, EventsState};
pub use models::{DlqEvent, EventMirror};
pub use pipeline::{EventPipeline, DEFAULT_TOPIC_PATTERNS};
pub use repository::EventRepository;
