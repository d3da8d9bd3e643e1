//! Error types for Resource Manager calls.
//!
//! Transport and decoding failures are kept apart from the errors the
//! service itself returns. Everything converts into a
//! [`ProviderError`] before it leaves the crate.

use provision::{ErrorCategory, ProviderError};
use serde_json::Value;
use std::io;

/// Result type alias for armkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to Resource Manager.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request could not be completed.
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// Request did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The service answered with an error body.
    #[error("{code}: {message}")]
    Service {
        /// HTTP status code
        status: u16,
        /// Resource Manager error code
        code: String,
        /// Human-readable message
        message: String,
    },

    /// Response body was not what we expected.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Failed to run an external program (e.g. the Azure CLI).
    #[error("failed to run {program}: {source}")]
    Io {
        /// Program that was being executed
        program: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Build a service error from a status code and an ARM error body
    ///
    /// ARM wraps errors as `{"error": {"code": ..., "message": ...}}`; some
    /// endpoints return the inner object directly.
    pub fn from_body(status: u16, body: &Value) -> Self {
        let inner = body.get("error").filter(|e| e.is_object()).unwrap_or(body);

        let code = inner
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| status_code_name(status).to_string());

        let message = inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| body.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {status}"));

        Self::Service {
            status,
            code,
            message,
        }
    }

    /// Get the provider error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Service { status, code, .. } => match ErrorCategory::from_code(code) {
                ErrorCategory::Other => status_category(*status),
                category => category,
            },
            Self::InvalidResponse(_) => ErrorCategory::Other,
            Self::Io { .. } => ErrorCategory::Auth,
        }
    }
}

fn status_code_name(status: u16) -> &'static str {
    match status {
        400 => "BadRequest",
        401 => "AuthenticationFailed",
        403 => "AuthorizationFailed",
        404 => "NotFound",
        409 => "Conflict",
        429 => "TooManyRequests",
        _ => "HttpError",
    }
}

fn status_category(status: u16) -> ErrorCategory {
    match status {
        400 => ErrorCategory::Validation,
        401 | 403 => ErrorCategory::Auth,
        404 => ErrorCategory::NotFound,
        409 => ErrorCategory::Conflict,
        429 => ErrorCategory::Busy,
        500..=599 => ErrorCategory::Network,
        _ => ErrorCategory::Other,
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(t) => Self::Timeout(t.to_string()),
            ureq::Error::StatusCode(code) => Self::Service {
                status: code,
                code: status_code_name(code).to_string(),
                message: format!("HTTP {code}"),
            },
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

impl From<Error> for ProviderError {
    fn from(err: Error) -> Self {
        let category = err.category();
        let code = match &err {
            Error::Transport(_) => "NetworkError".to_string(),
            Error::Timeout(_) => "OperationTimedOut".to_string(),
            Error::Service { code, .. } => code.clone(),
            Error::InvalidResponse(_) => "InvalidResponse".to_string(),
            Error::Io { .. } => "CredentialUnavailable".to_string(),
        };
        let message = match &err {
            Error::Service { message, .. } => message.clone(),
            other => other.to_string(),
        };
        ProviderError::with_category(code, message, category)
    }
}
