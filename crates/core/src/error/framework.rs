use super::codes::ErrorCode;
use super::context::ErrorContext;
use serde::Serialize;
use serde_json::json;

/// Runtime posture that controls how much error detail leaves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Operational severity, independent of the HTTP status the error maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    Availability,
    Internal,
}

impl ErrorCategory {
    fn for_code(code: ErrorCode) -> Self {
        match code.taxonomy_kind() {
            "validation_error" => ErrorCategory::Validation,
            "unauthenticated" => ErrorCategory::Authentication,
            "forbidden" => ErrorCategory::Authorization,
            "not_found" => ErrorCategory::NotFound,
            "conflict" => ErrorCategory::Conflict,
            "resource_busy" | "upstream_failure" | "timeout" => ErrorCategory::Availability,
            _ => ErrorCategory::Internal,
        }
    }
}

/// The platform's single error type.
///
/// Every fallible operation in the workspace returns `Result<T>` from this
/// module. The `source` field is preserved for `tracing` instrumentation and
/// is stripped before any client-facing serialization.
#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub severity: ErrorSeverity,
    pub category: ErrorCategory,
    pub context: ErrorContext,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let severity = if code.should_log_as_error() {
            ErrorSeverity::High
        } else {
            ErrorSeverity::Low
        };
        Self {
            category: ErrorCategory::for_code(code),
            code,
            message: message.into(),
            severity,
            context: ErrorContext::new(),
            source: None,
        }
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthenticationRequired, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message).with_severity(ErrorSeverity::Critical)
    }

    pub fn resource_busy(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceBusy, message).with_severity(ErrorSeverity::Medium)
    }

    pub fn upstream_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamFailure, message).with_severity(ErrorSeverity::High)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message).with_severity(ErrorSeverity::Medium)
    }

    /// Renders the client-facing JSON body, sanitized per `environment`.
    ///
    /// In production, internal-error messages are collapsed to a generic
    /// phrase; the full message and source chain still go to the tracing
    /// event this error is logged alongside. Shape is `{"detail": "..."}`
    /// per §6 "All endpoints ... Error responses".
    pub fn to_api_response(&self, environment: Environment) -> serde_json::Value {
        let expose_detail = !environment.is_production() || self.severity == ErrorSeverity::Low;
        let message = if expose_detail {
            self.message.clone()
        } else {
            "An internal error occurred. Reference the error id in support requests.".to_string()
        };

        json!({ "detail": message })
    }

    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Turns any [`Error`] into an HTTP response shaped `{"detail": "..."}`
/// (§6), logging full context server-side first (§7 "never leak internals").
/// `ENVIRONMENT` gates how much detail the body carries, matching
/// `Config::load()`'s own environment detection.
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use axum::Json;

        let environment = Environment::from_str(
            &std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        );

        if self.code.should_log_as_error() {
            tracing::error!(
                code = %self.code,
                error_id = %self.context.error_id,
                request_id = ?self.context.request_id,
                source = ?self.source,
                "{}",
                self.message
            );
        } else {
            tracing::debug!(code = %self.code, request_id = ?self.context.request_id, "{}", self.message);
        }

        super::metrics::ErrorMetrics::record_global(self.code);

        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.to_api_response(environment))).into_response();

        if self.code == ErrorCode::ResourceBusy {
            if let Ok(value) = axum::http::HeaderValue::from_str("5") {
                response.headers_mut().insert("retry-after", value);
            }
        }

        response
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::not_found("requested resource does not exist"),
            sqlx::Error::PoolTimedOut => {
                Self::resource_busy("database pool exhausted").with_source(err)
            }
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::conflict("resource already exists").with_source(err)
            }
            _ => Self::internal("database operation failed").with_source(err),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::new(ErrorCode::ValidationFailed, err.to_string())
    }
}
