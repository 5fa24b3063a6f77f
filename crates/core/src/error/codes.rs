use serde::{Deserialize, Serialize};
use std::fmt;

/// Standardized error codes shared across the platform.
///
/// Codes are grouped by the error taxonomy (`validation_error`,
/// `unauthenticated`, `forbidden`, `not_found`, `conflict`, `resource_busy`,
/// `upstream_failure`, `internal_error`, `timeout`) and map deterministically
/// to an HTTP status via [`ErrorCode::http_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation (422)
    ValidationFailed,
    InvalidInput,
    MissingRequiredField,
    InvalidFormat,
    ValueOutOfRange,

    // Authentication (401)
    AuthenticationRequired,
    InvalidCredentials,
    SessionExpired,
    SessionInvalid,

    // Authorization (403)
    Forbidden,
    PermissionDenied,

    // Resource (404 / 409)
    NotFound,
    Conflict,
    DuplicateValue,

    // Availability (503 / 502 / 504)
    ResourceBusy,
    UpstreamFailure,
    Timeout,

    // Catch-all (500)
    InternalError,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFormat
            | ErrorCode::ValueOutOfRange => 422,

            ErrorCode::AuthenticationRequired
            | ErrorCode::InvalidCredentials
            | ErrorCode::SessionExpired
            | ErrorCode::SessionInvalid => 401,

            ErrorCode::Forbidden | ErrorCode::PermissionDenied => 403,

            ErrorCode::NotFound => 404,
            ErrorCode::Conflict | ErrorCode::DuplicateValue => 409,

            ErrorCode::ResourceBusy => 503,
            ErrorCode::UpstreamFailure => 502,
            ErrorCode::Timeout => 504,

            ErrorCode::InternalError => 500,
        }
    }

    pub fn taxonomy_kind(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFormat
            | ErrorCode::ValueOutOfRange => "validation_error",

            ErrorCode::AuthenticationRequired
            | ErrorCode::InvalidCredentials
            | ErrorCode::SessionExpired
            | ErrorCode::SessionInvalid => "unauthenticated",

            ErrorCode::Forbidden | ErrorCode::PermissionDenied => "forbidden",

            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict | ErrorCode::DuplicateValue => "conflict",

            ErrorCode::ResourceBusy => "resource_busy",
            ErrorCode::UpstreamFailure => "upstream_failure",
            ErrorCode::Timeout => "timeout",

            ErrorCode::InternalError => "internal_error",
        }
    }

    /// Errors that represent normal client mistakes, not operational incidents.
    pub fn should_log_as_error(&self) -> bool {
        !matches!(
            self,
            ErrorCode::ValidationFailed
                | ErrorCode::InvalidInput
                | ErrorCode::MissingRequiredField
                | ErrorCode::InvalidFormat
                | ErrorCode::ValueOutOfRange
                | ErrorCode::NotFound
                | ErrorCode::InvalidCredentials
                | ErrorCode::PermissionDenied
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
