pub mod platform;
pub mod registry;

pub use platform::PlatformMetrics;
pub use registry::{MetricsRegistry, MetricsService};
