mod codes;
mod context;
mod framework;
mod metrics;

pub use codes::ErrorCode;
pub use context::{ErrorContext, RequestContext};
pub use framework::{Environment, Error, ErrorCategory, ErrorSeverity, Result};
pub use metrics::ErrorMetrics;
