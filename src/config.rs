//! Project configuration
//!
//! A project is one config file describing a subscription, a resource group
//! and (optionally) a VM stack. Files live in the config directory and are
//! JSON or TOML, picked by extension:
//!
//! ```toml
//! subscription_id = "00000000-0000-0000-0000-000000000000"
//! interactive = true
//!
//! [resource_group]
//! name = "rg-mlops-dev"
//! location = "eastus"
//!
//! [vm]
//! name = "vm-mlops"
//! size = "Standard_B2s"
//! admin_username = "azureuser"
//! ssh_public_key_path = "~/.ssh/id_ed25519.pub"
//! virtual_network = "vnet-mlops"
//! sub_network = "snet-mlops"
//! network_security_grp = "nsg-mlops"
//! public_ip = "pip-mlops"
//! network_interface = "nic-mlops"
//! ```

use crate::paths;
use anyhow::{Context, Result, bail, ensure};
use armkit::ClientSettings;
use provision::{DEFAULT_OS_DISK_TYPE, ImageReference, ProvisionRequest, ResourceNames};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub subscription_id: String,
    /// Run the menu when no subcommand is given
    #[serde(default)]
    pub interactive: bool,
    pub resource_group: ResourceGroupConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm: Option<VmConfig>,
    #[serde(default)]
    pub azure: AzureConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroupConfig {
    pub name: String,
    #[serde(default = "default_location")]
    pub location: String,
}

fn default_location() -> String {
    "eastus".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmConfig {
    pub name: String,
    pub size: String,
    pub admin_username: String,
    pub ssh_public_key_path: String,
    pub virtual_network: String,
    pub sub_network: String,
    pub network_security_grp: String,
    pub public_ip: String,
    pub network_interface: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_disk_type: Option<String>,
}

/// Resource Manager client tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    pub endpoint: String,
    pub poll_interval_secs: u64,
    pub max_wait_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for AzureConfig {
    fn default() -> Self {
        let defaults = ClientSettings::default();
        Self {
            endpoint: defaults.endpoint,
            poll_interval_secs: defaults.poll_interval.as_secs(),
            max_wait_secs: defaults.max_wait.as_secs(),
            request_timeout_secs: defaults.request_timeout.as_secs(),
        }
    }
}

impl AzureConfig {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.poll_interval_secs > 0,
            "azure.poll_interval_secs must be at least 1"
        );
        Ok(())
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            endpoint: self.endpoint.clone(),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_wait: Duration::from_secs(self.max_wait_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

impl AppConfig {
    /// Load a config file, choosing the parser by extension
    pub fn load(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path).with_context(|| {
            format!(
                "Unsupported config format: {} (expected .json or .toml)",
                path.display()
            )
        })?;
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content, format).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(content).context("Invalid JSON format")?,
            ConfigFormat::Toml => toml::from_str(content).context("Invalid TOML format")?,
        };
        config.azure.validate()?;
        Ok(config)
    }

    fn vm(&self) -> Result<&VmConfig> {
        self.vm
            .as_ref()
            .context("No [vm] section in config; VM commands need one")
    }

    pub fn vm_name(&self) -> Result<&str> {
        Ok(&self.vm()?.name)
    }

    pub fn names(&self) -> Result<ResourceNames> {
        let vm = self.vm()?;
        Ok(ResourceNames {
            virtual_network: vm.virtual_network.clone(),
            subnet: vm.sub_network.clone(),
            security_group: vm.network_security_grp.clone(),
            public_ip: vm.public_ip.clone(),
            network_interface: vm.network_interface.clone(),
            vm: vm.name.clone(),
        })
    }

    /// Build a provisioning request, reading the SSH public key from disk
    pub fn to_request(&self) -> Result<ProvisionRequest> {
        let vm = self.vm()?;
        let key_path = paths::expand(&vm.ssh_public_key_path);
        let ssh_public_key = fs::read_to_string(&key_path)
            .with_context(|| format!("Could not read SSH public key {}", key_path.display()))?;

        Ok(ProvisionRequest {
            subscription_id: self.subscription_id.clone(),
            resource_group: self.resource_group.name.clone(),
            location: self.resource_group.location.clone(),
            vm_size: vm.size.clone(),
            admin_username: vm.admin_username.clone(),
            ssh_public_key: ssh_public_key.trim().to_string(),
            names: self.names()?,
            image: vm.image.clone().unwrap_or_default(),
            os_disk_type: vm
                .os_disk_type
                .clone()
                .unwrap_or_else(|| DEFAULT_OS_DISK_TYPE.to_string()),
        })
    }
}

// ============================================================================
// Projects
// ============================================================================

/// A config file found in the config directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
}

/// List project config files in `dir`, sorted by name
///
/// A missing directory yields no projects.
pub fn discover_projects(dir: &Path) -> Result<Vec<Project>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut projects = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Could not read {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() || ConfigFormat::from_path(&path).is_none() {
            continue;
        }
        if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
            projects.push(Project {
                name: name.to_string(),
                path: path.clone(),
            });
        }
    }
    projects.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(projects)
}

/// Resolve which config file to use
///
/// `--config` wins; otherwise `--project` names a file in the config
/// directory; otherwise a lone project is picked automatically.
pub fn resolve(config: Option<&Path>, project: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = config {
        return Ok(path.to_path_buf());
    }

    let dir = paths::config_dir()?;
    let projects = discover_projects(&dir)?;

    if let Some(name) = project {
        return projects
            .into_iter()
            .find(|p| p.name == name)
            .map(|p| p.path)
            .with_context(|| format!("No project '{name}' in {}", dir.display()));
    }

    match projects.as_slice() {
        [only] => Ok(only.path.clone()),
        [] => bail!(
            "No project configs in {}; pass --config <file>",
            dir.display()
        ),
        many => bail!(
            "Several projects found ({}); pick one with --project",
            many.iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::{ENV_CONFIG_DIR, tests::with_env_var};
    use tempfile::TempDir;

    const JSON: &str = r#"{
        "subscription_id": "sub-1",
        "interactive": true,
        "resource_group": { "name": "rg-mlops-dev" },
        "vm": {
            "name": "vm-mlops",
            "size": "Standard_B2s",
            "admin_username": "azureuser",
            "ssh_public_key_path": "KEY_PATH",
            "virtual_network": "vnet-mlops",
            "sub_network": "snet-mlops",
            "network_security_grp": "nsg-mlops",
            "public_ip": "pip-mlops",
            "network_interface": "nic-mlops"
        }
    }"#;

    const TOML: &str = r#"
subscription_id = "sub-1"

[resource_group]
name = "rg-llm"
location = "westeurope"

[azure]
poll_interval_secs = 2
"#;

    #[test]
    fn test_parse_json() {
        let config = AppConfig::parse(JSON, ConfigFormat::Json).unwrap();
        assert!(config.interactive);
        assert_eq!(config.resource_group.location, "eastus");
        let names = config.names().unwrap();
        assert_eq!(names.subnet, "snet-mlops");
        assert_eq!(names.security_group, "nsg-mlops");
        assert_eq!(config.azure, AzureConfig::default());
    }

    #[test]
    fn test_parse_toml_without_vm() {
        let config = AppConfig::parse(TOML, ConfigFormat::Toml).unwrap();
        assert!(!config.interactive);
        assert_eq!(config.resource_group.location, "westeurope");
        assert!(config.names().is_err());

        let settings = config.azure.client_settings();
        assert_eq!(settings.poll_interval, Duration::from_secs(2));
        assert_eq!(settings.max_wait, Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let content = TOML.replace("poll_interval_secs = 2", "poll_interval_secs = 0");
        let err = AppConfig::parse(&content, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn test_load_picks_format_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("llm.toml");
        fs::write(&path, TOML).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap().resource_group.name, "rg-llm");

        let bad = dir.path().join("llm.yaml");
        fs::write(&bad, TOML).unwrap();
        let err = AppConfig::load(&bad).unwrap_err();
        assert!(err.to_string().contains("Unsupported config format"));
    }

    #[test]
    fn test_to_request_reads_key() {
        let dir = TempDir::new().unwrap();
        let key = dir.path().join("id.pub");
        fs::write(&key, "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAITest me@host\n").unwrap();

        let json = JSON.replace("KEY_PATH", &key.display().to_string());
        let config = AppConfig::parse(&json, ConfigFormat::Json).unwrap();
        let request = config.to_request().unwrap();

        assert_eq!(request.ssh_public_key, "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAITest me@host");
        assert_eq!(request.resource_group, "rg-mlops-dev");
        assert_eq!(request.os_disk_type, DEFAULT_OS_DISK_TYPE);
        assert_eq!(request.image, ImageReference::default());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_to_request_missing_key_file() {
        let json = JSON.replace("KEY_PATH", "/nonexistent/azprov/id.pub");
        let config = AppConfig::parse(&json, ConfigFormat::Json).unwrap();
        let err = config.to_request().unwrap_err();
        assert!(err.to_string().contains("Could not read SSH public key"));
    }

    #[test]
    fn test_discover_projects() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("my-mlops.json"), JSON).unwrap();
        fs::write(dir.path().join("my-llm.toml"), TOML).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("sub.json")).unwrap();

        let names: Vec<_> = discover_projects(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["my-llm", "my-mlops"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let projects = discover_projects(Path::new("/nonexistent/azprov-config")).unwrap();
        assert!(projects.is_empty());
    }

    #[test]
    fn test_resolve() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("my-mlops.json"), JSON).unwrap();

        let explicit = PathBuf::from("/somewhere/else.toml");
        assert_eq!(resolve(Some(&explicit), Some("ignored")).unwrap(), explicit);

        with_env_var(ENV_CONFIG_DIR, &dir.path().display().to_string(), || {
            // A single project is picked without --project
            assert_eq!(
                resolve(None, None).unwrap(),
                dir.path().join("my-mlops.json")
            );

            fs::write(dir.path().join("my-llm.toml"), TOML).unwrap();
            let err = resolve(None, None).unwrap_err();
            assert!(err.to_string().contains("my-llm, my-mlops"));

            assert_eq!(
                resolve(None, Some("my-llm")).unwrap(),
                dir.path().join("my-llm.toml")
            );
            assert!(resolve(None, Some("missing")).is_err());
        });
    }
}
