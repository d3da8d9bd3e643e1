//! Credential providers for Resource Manager.
//!
//! - [`EnvironmentCredential`]: service principal secret from `AZURE_*`
//!   environment variables, exchanged for a token with the client
//!   credentials grant
//! - [`AzureCliCredential`]: token from an existing `az login` session
//! - [`DefaultCredential`]: tries the two above in that order

use crate::error::Error;
use crate::transport::{Request, Transport, UreqTransport};
use provision::{Credential, CredentialProvider, ErrorCategory, ProviderError};
use serde::Deserialize;
use std::process::Command;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Token audience for Resource Manager
pub const MANAGEMENT_RESOURCE: &str = "https://management.azure.com/";

/// Public cloud identity authority
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

const TENANT_VAR: &str = "AZURE_TENANT_ID";
const CLIENT_ID_VAR: &str = "AZURE_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "AZURE_CLIENT_SECRET";

fn unavailable(message: impl Into<String>) -> ProviderError {
    ProviderError::with_category("CredentialUnavailable", message, ErrorCategory::Auth)
}

/// Service principal credential from the environment
pub struct EnvironmentCredential<T = UreqTransport> {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    authority: String,
    transport: T,
}

impl EnvironmentCredential<UreqTransport> {
    /// Read `AZURE_TENANT_ID`, `AZURE_CLIENT_ID` and `AZURE_CLIENT_SECRET`.
    ///
    /// Returns `None` unless all three are set and non-empty.
    pub fn from_env() -> Option<Self> {
        Self::from_vars(|name| std::env::var(name).ok(), UreqTransport::default())
    }
}

impl<T: Transport> EnvironmentCredential<T> {
    /// Build from an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>, transport: T) -> Option<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Some(Self {
            tenant_id: get(TENANT_VAR)?,
            client_id: get(CLIENT_ID_VAR)?,
            client_secret: get(CLIENT_SECRET_VAR)?,
            authority: DEFAULT_AUTHORITY.to_string(),
            transport,
        })
    }

    /// Use a different identity authority (sovereign clouds, tests)
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into().trim_end_matches('/').to_string();
        self
    }

    fn token_url(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority, self.tenant_id)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

impl<T: Transport> CredentialProvider for EnvironmentCredential<T> {
    fn get_credential(&self) -> Result<Credential, ProviderError> {
        log::debug!("Requesting token for client {}", self.client_id);
        let scope = format!("{MANAGEMENT_RESOURCE}.default");
        let request = Request::post(self.token_url()).form([
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope.as_str()),
        ]);

        let reply = self.transport.send(&request)?;
        if !reply.is_success() {
            // Identity errors use {"error": "...", "error_description": "..."}
            let code = reply.body.get("error").and_then(|v| v.as_str());
            let description = reply
                .body
                .get("error_description")
                .and_then(|v| v.as_str());
            return Err(ProviderError::with_category(
                code.unwrap_or("AuthenticationFailed"),
                description.unwrap_or("token request was rejected"),
                ErrorCategory::Auth,
            ));
        }

        let token: TokenResponse = serde_json::from_value(reply.body).map_err(Error::from)?;
        let expires_at = token
            .expires_in
            .and_then(|secs| SystemTime::now().checked_add(Duration::from_secs(secs)));
        Ok(Credential::bearer(token.access_token, expires_at))
    }
}

/// Token from the Azure CLI login cache
#[derive(Debug, Clone)]
pub struct AzureCliCredential {
    program: String,
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        Self {
            program: "az".to_string(),
        }
    }
}

impl AzureCliCredential {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different `az` executable
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    /// Unix timestamp, present in newer CLI releases
    #[serde(rename = "expires_on")]
    expires_on: Option<u64>,
}

/// Parse the JSON printed by `az account get-access-token`
pub fn parse_cli_token(output: &str) -> Result<Credential, ProviderError> {
    let token: CliToken = serde_json::from_str(output).map_err(|e| {
        unavailable(format!("unexpected output from az account get-access-token: {e}"))
    })?;
    if token.access_token.is_empty() {
        return Err(unavailable("az returned an empty access token"));
    }
    let expires_at = token
        .expires_on
        .and_then(|secs| UNIX_EPOCH.checked_add(Duration::from_secs(secs)));
    Ok(Credential::bearer(token.access_token, expires_at))
}

impl CredentialProvider for AzureCliCredential {
    fn get_credential(&self) -> Result<Credential, ProviderError> {
        log::debug!("Requesting token from {}", self.program);
        let output = Command::new(&self.program)
            .args([
                "account",
                "get-access-token",
                "--resource",
                MANAGEMENT_RESOURCE,
                "--output",
                "json",
            ])
            .output()
            .map_err(|source| Error::Io {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Err(unavailable(if stderr.is_empty() {
                "az account get-access-token failed; run 'az login'".to_string()
            } else {
                stderr.to_string()
            }));
        }

        parse_cli_token(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Environment first, then the Azure CLI
pub struct DefaultCredential {
    sources: Vec<(&'static str, Box<dyn CredentialProvider>)>,
}

impl DefaultCredential {
    pub fn new() -> Self {
        let mut sources: Vec<(&'static str, Box<dyn CredentialProvider>)> = Vec::new();
        if let Some(env) = EnvironmentCredential::from_env() {
            sources.push(("environment", Box::new(env)));
        }
        sources.push(("azure cli", Box::new(AzureCliCredential::new())));
        Self { sources }
    }

    /// Chain arbitrary providers, tried in order
    pub fn from_sources(sources: Vec<(&'static str, Box<dyn CredentialProvider>)>) -> Self {
        Self { sources }
    }
}

impl Default for DefaultCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for DefaultCredential {
    fn get_credential(&self) -> Result<Credential, ProviderError> {
        let mut failures = Vec::new();
        for (name, source) in &self.sources {
            match source.get_credential() {
                Ok(credential) => {
                    log::info!("Authenticated using {name} credential");
                    return Ok(credential);
                }
                Err(err) => {
                    log::debug!("{name} credential unavailable: {err}");
                    failures.push(format!("{name}: {}", err.message));
                }
            }
        }
        Err(unavailable(if failures.is_empty() {
            "no credential sources configured".to_string()
        } else {
            failures.join("; ")
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, Payload, Reply};
    use serde_json::json;
    use std::collections::HashMap;

    fn vars() -> HashMap<&'static str, String> {
        HashMap::from([
            (TENANT_VAR, "tenant-1".to_string()),
            (CLIENT_ID_VAR, "client-1".to_string()),
            (CLIENT_SECRET_VAR, "s3cret".to_string()),
        ])
    }

    #[test]
    fn test_env_requires_all_vars() {
        let mut partial = vars();
        partial.remove(CLIENT_SECRET_VAR);
        let cred =
            EnvironmentCredential::from_vars(|k| partial.get(k).cloned(), MockTransport::new());
        assert!(cred.is_none());

        let mut blank = vars();
        blank.insert(TENANT_VAR, "  ".to_string());
        let cred =
            EnvironmentCredential::from_vars(|k| blank.get(k).cloned(), MockTransport::new());
        assert!(cred.is_none());
    }

    #[test]
    fn test_env_client_credentials_grant() {
        let all = vars();
        let mock = MockTransport::new();
        mock.push(Reply::new(
            200,
            json!({"token_type": "Bearer", "expires_in": 3599, "access_token": "eyJ0"}),
        ));

        let cred = EnvironmentCredential::from_vars(|k| all.get(k).cloned(), mock.clone())
            .unwrap()
            .get_credential()
            .unwrap();
        assert_eq!(cred.secret(), "eyJ0");
        assert!(!cred.is_expired());

        let request = &mock.requests()[0];
        assert_eq!(
            request.url,
            "https://login.microsoftonline.com/tenant-1/oauth2/v2.0/token"
        );
        let Payload::Form(pairs) = &request.payload else {
            panic!("expected form body");
        };
        assert!(pairs.contains(&("grant_type".into(), "client_credentials".into())));
        assert!(pairs.contains(&(
            "scope".into(),
            "https://management.azure.com/.default".into()
        )));
    }

    #[test]
    fn test_env_rejected_secret() {
        let all = vars();
        let mock = MockTransport::new();
        mock.push(Reply::new(
            401,
            json!({"error": "invalid_client", "error_description": "AADSTS7000215: Invalid client secret provided."}),
        ));

        let err = EnvironmentCredential::from_vars(|k| all.get(k).cloned(), mock)
            .unwrap()
            .get_credential()
            .unwrap_err();
        assert_eq!(err.code, "invalid_client");
        assert_eq!(err.category, ErrorCategory::Auth);
    }

    #[test]
    fn test_parse_cli_token() {
        let output = r#"{
            "accessToken": "eyJ0eXAi",
            "expiresOn": "2030-01-01 00:00:00.000000",
            "expires_on": 1893456000,
            "subscription": "sub-1",
            "tenant": "tenant-1",
            "tokenType": "Bearer"
        }"#;
        let cred = parse_cli_token(output).unwrap();
        assert_eq!(cred.secret(), "eyJ0eXAi");
        assert_eq!(
            cred.expires_at(),
            Some(UNIX_EPOCH + Duration::from_secs(1_893_456_000))
        );
    }

    #[test]
    fn test_unrepresentable_expiry_is_dropped() {
        let output = r#"{"accessToken": "eyJ0", "expires_on": 18446744073709551615}"#;
        let cred = parse_cli_token(output).unwrap();
        assert_eq!(cred.expires_at(), None);

        let all = vars();
        let mock = MockTransport::new();
        mock.push(Reply::new(
            200,
            json!({"access_token": "eyJ0", "expires_in": u64::MAX}),
        ));
        let cred = EnvironmentCredential::from_vars(|k| all.get(k).cloned(), mock)
            .unwrap()
            .get_credential()
            .unwrap();
        assert!(!cred.is_expired());
    }

    #[test]
    fn test_parse_cli_token_rejects_garbage() {
        let err = parse_cli_token("Please run 'az login' to setup account.").unwrap_err();
        assert_eq!(err.code, "CredentialUnavailable");
        assert_eq!(err.category, ErrorCategory::Auth);
    }

    #[test]
    fn test_missing_cli_is_auth_error() {
        let cli = AzureCliCredential::with_program("definitely-not-az-xyz");
        let err = cli.get_credential().unwrap_err();
        assert_eq!(err.category, ErrorCategory::Auth);
    }

    fn source(
        name: &'static str,
        result: Result<Credential, ProviderError>,
    ) -> (&'static str, Box<dyn CredentialProvider>) {
        (name, Box::new(move || result.clone()))
    }

    #[test]
    fn test_chain_falls_through() {
        let chain = DefaultCredential::from_sources(vec![
            source("first", Err(unavailable("not logged in"))),
            source("second", Ok(Credential::bearer("second", None))),
        ]);
        assert_eq!(chain.get_credential().unwrap().secret(), "second");
    }

    #[test]
    fn test_chain_reports_every_failure() {
        let chain = DefaultCredential::from_sources(vec![
            source("env", Err(unavailable("no env"))),
            source("cli", Err(unavailable("no cli"))),
        ]);
        let err = chain.get_credential().unwrap_err();
        assert_eq!(err.code, "CredentialUnavailable");
        assert_eq!(err.message, "env: no env; cli: no cli");
    }
}
