//! Credential provider seam

use crate::error::ProviderError;
use std::fmt;
use std::time::SystemTime;

/// Opaque credential used to authenticate management API calls
#[derive(Clone)]
pub struct Credential {
    token: String,
    expires_at: Option<SystemTime>,
}

impl Credential {
    pub fn bearer(token: impl Into<String>, expires_at: Option<SystemTime>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// The secret bearer token
    pub fn secret(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    /// Whether the credential is past its expiry
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|t| t <= SystemTime::now())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of credentials
///
/// Implementations decide where credentials come from (environment, CLI
/// login cache, managed identity). Failure must be reported before any
/// resource is touched.
pub trait CredentialProvider {
    fn get_credential(&self) -> Result<Credential, ProviderError>;
}

impl<F> CredentialProvider for F
where
    F: Fn() -> Result<Credential, ProviderError>,
{
    fn get_credential(&self) -> Result<Credential, ProviderError> {
        self()
    }
}
