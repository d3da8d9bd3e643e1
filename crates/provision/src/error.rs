//! Error types for provisioning operations.
//!
//! Provider errors are categorized from the machine-readable code the cloud
//! returns, so callers can give actionable feedback. The category never
//! changes control flow inside a transaction: any creation error rolls back.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Categories of provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Authentication or authorization failure
    Auth,
    /// Subscription quota or SKU capacity exhausted
    Quota,
    /// Name or state conflict with an existing resource
    Conflict,
    /// Resource does not exist
    NotFound,
    /// Request rejected as malformed or invalid
    Validation,
    /// Resource is still referenced or another operation is in progress
    Busy,
    /// Transport-level failure talking to the provider
    Network,
    /// Long-running operation did not reach a terminal state in time
    Timeout,
    /// Anything else
    Other,
}

impl ErrorCategory {
    /// Map a provider error code to a category.
    ///
    /// Codes follow Azure Resource Manager naming; unknown codes map to
    /// [`ErrorCategory::Other`].
    pub fn from_code(code: &str) -> Self {
        match code {
            "AuthenticationFailed"
            | "AuthorizationFailed"
            | "InvalidAuthenticationToken"
            | "ExpiredAuthenticationToken"
            | "InvalidAuthenticationTokenTenant"
            | "CredentialUnavailable"
            | "LinkedAuthorizationFailed" => Self::Auth,
            "QuotaExceeded"
            | "OperationNotAllowed"
            | "SkuNotAvailable"
            | "PublicIPCountLimitReached"
            | "ZonalAllocationFailed"
            | "AllocationFailed" => Self::Quota,
            "Conflict" | "ResourceExists" | "DnsRecordInUse" | "InvalidResourceReference" => {
                Self::Conflict
            }
            "NotFound"
            | "ResourceNotFound"
            | "ResourceGroupNotFound"
            | "ParentResourceNotFound" => {
                Self::NotFound
            }
            "InvalidParameter"
            | "InvalidRequestContent"
            | "InvalidRequestFormat"
            | "InvalidResourceName"
            | "InvalidTemplate"
            | "LinkedInvalidPropertyId"
            | "ConfigurationError" => Self::Validation,
            "AnotherOperationInProgress"
            | "InUseSubnetCannotBeDeleted"
            | "InUseNetworkSecurityGroupCannotBeDeleted"
            | "PublicIPAddressCannotBeDeleted"
            | "NicInUse"
            | "ResourceBusy"
            | "RetryableError" => Self::Busy,
            "NetworkError" => Self::Network,
            "OperationTimedOut" => Self::Timeout,
            _ => Self::Other,
        }
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Auth => "Authentication failed",
            Self::Quota => "Quota exceeded",
            Self::Conflict => "Resource conflict",
            Self::NotFound => "Resource not found",
            Self::Validation => "Invalid request",
            Self::Busy => "Resource busy",
            Self::Network => "Network connectivity issue",
            Self::Timeout => "Operation timed out",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Auth => "Run `az login` or set AZURE_TENANT_ID/AZURE_CLIENT_ID/AZURE_CLIENT_SECRET",
            Self::Quota => "Request a quota increase or pick another VM size or location",
            Self::Conflict => "Choose different resource names or remove the existing resource",
            Self::NotFound => "Check the resource group and resource names",
            Self::Validation => "Check the configuration values sent to the provider",
            Self::Busy => "Wait for in-flight operations to finish and try again",
            Self::Network => "Check your internet connection and try again",
            Self::Timeout => "Check the resource in the portal; it may still be provisioning",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// An error reported by the cloud provider (or the transport in front of it).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{code}: {message}")]
pub struct ProviderError {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Category derived from the code
    pub category: ErrorCategory,
}

impl ProviderError {
    /// Create an error, deriving the category from the code.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let category = ErrorCategory::from_code(&code);
        Self {
            code,
            message: message.into(),
            category,
        }
    }

    /// Create an error with an explicit category.
    pub fn with_category(
        code: impl Into<String>,
        message: impl Into<String>,
        category: ErrorCategory,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            category,
        }
    }

    /// Whether the provider reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.category == ErrorCategory::NotFound
    }
}

/// Errors surfaced by the [`Provisioner`](crate::Provisioner) entry points.
///
/// Creation failures inside the VM transaction are not errors at this level:
/// they are reported through [`ProvisionOutcome::Failure`](crate::ProvisionOutcome).
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A required input is missing or malformed; nothing was created.
    #[error("invalid configuration for {field}: {message}")]
    Configuration {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// No usable credential could be acquired; nothing was created.
    #[error("could not acquire credentials: {0}")]
    Credential(#[source] ProviderError),

    /// A single (non-transactional) provider call failed.
    #[error("{operation} failed: {source}")]
    Provider {
        /// What was being attempted
        operation: String,
        /// Underlying provider error
        #[source]
        source: ProviderError,
    },
}

impl ProvisionError {
    pub(crate) fn config(field: &'static str, message: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn provider(operation: impl Into<String>, source: ProviderError) -> Self {
        Self::Provider {
            operation: operation.into(),
            source,
        }
    }

    /// Category of the underlying provider error, if any.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Configuration { .. } => None,
            Self::Credential(e) | Self::Provider { source: e, .. } => Some(e.category),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code("QuotaExceeded"), ErrorCategory::Quota);
        assert_eq!(ErrorCategory::from_code("AuthorizationFailed"), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code("ResourceNotFound"), ErrorCategory::NotFound);
        assert_eq!(ErrorCategory::from_code("NicInUse"), ErrorCategory::Busy);
        assert_eq!(ErrorCategory::from_code("SomethingNew"), ErrorCategory::Other);
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::new("QuotaExceeded", "Public IP limit reached");
        assert_eq!(err.to_string(), "QuotaExceeded: Public IP limit reached");
        assert_eq!(err.category, ErrorCategory::Quota);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_provision_error_category() {
        let err = ProvisionError::provider(
            "delete resource group",
            ProviderError::new("ResourceGroupNotFound", "gone"),
        );
        assert_eq!(err.category(), Some(ErrorCategory::NotFound));
        assert!(ProvisionError::config("vm.name", "empty").category().is_none());
    }
}
