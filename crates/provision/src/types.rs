//! Core types for VM provisioning

use crate::error::ProvisionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of cloud resource managed by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    ResourceGroup,
    VirtualNetwork,
    Subnet,
    SecurityGroup,
    PublicIp,
    NetworkInterface,
    VirtualMachine,
}

impl ResourceKind {
    /// Short label used in logs and reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::ResourceGroup => "resource_group",
            Self::VirtualNetwork => "vnet",
            Self::Subnet => "subnet",
            Self::SecurityGroup => "nsg",
            Self::PublicIp => "public_ip",
            Self::NetworkInterface => "nic",
            Self::VirtualMachine => "vm",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ResourceGroup => "Resource group",
            Self::VirtualNetwork => "Virtual network",
            Self::Subnet => "Subnet",
            Self::SecurityGroup => "Network security group",
            Self::PublicIp => "Public IP",
            Self::NetworkInterface => "Network interface",
            Self::VirtualMachine => "Virtual machine",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Opaque provider-assigned identifier for a created resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    /// Full provider resource id
    pub id: String,
    /// Resource name
    pub name: String,
}

impl Handle {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Reference to an existing resource, enough to delete it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
    /// Parent resource name (the virtual network for a subnet)
    pub parent: Option<String>,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            parent: None,
        }
    }

    pub fn child(kind: ResourceKind, name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            parent: Some(parent.into()),
        }
    }
}

/// Names of every resource in the VM stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNames {
    pub virtual_network: String,
    pub subnet: String,
    pub security_group: String,
    pub public_ip: String,
    pub network_interface: String,
    pub vm: String,
}

impl ResourceNames {
    /// Validate every name as a cloud resource name
    pub fn validate(&self) -> Result<(), ProvisionError> {
        check_name("vm.virtual_network", &self.virtual_network)?;
        check_name("vm.sub_network", &self.subnet)?;
        check_name("vm.network_security_grp", &self.security_group)?;
        check_name("vm.public_ip", &self.public_ip)?;
        check_name("vm.network_interface", &self.network_interface)?;
        check_name("vm.name", &self.vm)
    }
}

/// Marketplace image used for the OS disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
}

impl Default for ImageReference {
    fn default() -> Self {
        Self {
            publisher: "Canonical".to_string(),
            offer: "UbuntuServer".to_string(),
            sku: "22_04-lts-gen2".to_string(),
            version: "latest".to_string(),
        }
    }
}

/// Default managed disk type for the OS disk
pub const DEFAULT_OS_DISK_TYPE: &str = "StandardSSD_LRS";

/// Fully-resolved input for provisioning one VM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub subscription_id: String,
    pub resource_group: String,
    pub location: String,
    pub vm_size: String,
    pub admin_username: String,
    /// OpenSSH public key material (not a path)
    pub ssh_public_key: String,
    pub names: ResourceNames,
    pub image: ImageReference,
    pub os_disk_type: String,
}

impl ProvisionRequest {
    /// Check the request shape before any cloud call is made
    pub fn validate(&self) -> Result<(), ProvisionError> {
        require("subscription_id", &self.subscription_id)?;
        check_name("resource_group.name", &self.resource_group)?;
        require("resource_group.location", &self.location)?;
        require("vm.size", &self.vm_size)?;
        require("vm.admin_username", &self.admin_username)?;
        self.names.validate()?;
        check_ssh_key(&self.ssh_public_key)?;
        require("vm.os_disk_type", &self.os_disk_type)
    }

    /// Path where the SSH key is installed on the VM
    pub fn authorized_keys_path(&self) -> String {
        format!("/home/{}/.ssh/authorized_keys", self.admin_username)
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ProvisionError> {
    if value.trim().is_empty() {
        return Err(ProvisionError::config(field, "must not be empty"));
    }
    Ok(())
}

/// Check a name against the common resource naming rule:
/// 1-80 chars of alphanumerics, `-`, `_`, `.`; starts alphanumeric; no trailing `.`
pub fn check_name(field: &'static str, name: &str) -> Result<(), ProvisionError> {
    require(field, name)?;

    if name.len() > 80 {
        return Err(ProvisionError::config(
            field,
            format!("'{name}' is longer than 80 characters"),
        ));
    }

    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(ProvisionError::config(
            field,
            format!("'{name}' contains invalid character '{c}'"),
        ));
    }

    if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(ProvisionError::config(
            field,
            format!("'{name}' must start with a letter or digit"),
        ));
    }

    if name.ends_with('.') {
        return Err(ProvisionError::config(
            field,
            format!("'{name}' must not end with '.'"),
        ));
    }

    Ok(())
}

const SSH_KEY_PREFIXES: &[&str] = &["ssh-", "ecdsa-sha2-", "sk-"];

fn check_ssh_key(key: &str) -> Result<(), ProvisionError> {
    let key = key.trim();
    require("vm.ssh_public_key", key)?;

    let mut parts = key.split_whitespace();
    let algorithm = parts.next().unwrap_or_default();
    let body = parts.next();

    if !SSH_KEY_PREFIXES.iter().any(|p| algorithm.starts_with(p)) || body.is_none() {
        return Err(ProvisionError::config(
            "vm.ssh_public_key",
            "not an OpenSSH public key (expected e.g. 'ssh-ed25519 AAAA...')",
        ));
    }

    Ok(())
}

/// Inbound security rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRule {
    pub name: String,
    pub protocol: String,
    pub direction: String,
    pub access: String,
    pub priority: u32,
    pub source_address_prefix: String,
    pub destination_address_prefix: String,
    pub source_port_range: String,
    pub destination_port_range: String,
}

impl SecurityRule {
    /// Allow inbound SSH from anywhere
    pub fn allow_ssh() -> Self {
        Self {
            name: "AllowSSH".to_string(),
            protocol: "Tcp".to_string(),
            direction: "Inbound".to_string(),
            access: "Allow".to_string(),
            priority: 1000,
            source_address_prefix: "*".to_string(),
            destination_address_prefix: "*".to_string(),
            source_port_range: "*".to_string(),
            destination_port_range: "22".to_string(),
        }
    }
}

/// Public IP allocation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpAllocation {
    Dynamic,
    Static,
}

impl IpAllocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dynamic => "Dynamic",
            Self::Static => "Static",
        }
    }
}

/// Virtual machine creation properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmSpec {
    pub name: String,
    pub location: String,
    pub size: String,
    pub admin_username: String,
    pub ssh_public_key: String,
    pub authorized_keys_path: String,
    pub image: ImageReference,
    pub os_disk_type: String,
    pub nic_id: String,
}

/// Creation properties for one resource, tagged by kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceSpec {
    VirtualNetwork {
        name: String,
        location: String,
        address_prefixes: Vec<String>,
    },
    Subnet {
        name: String,
        virtual_network: String,
        address_prefix: String,
    },
    SecurityGroup {
        name: String,
        location: String,
        rules: Vec<SecurityRule>,
    },
    PublicIp {
        name: String,
        location: String,
        allocation: IpAllocation,
    },
    NetworkInterface {
        name: String,
        location: String,
        ip_config_name: String,
        subnet_id: String,
        public_ip_id: String,
        security_group_id: String,
    },
    VirtualMachine(Box<VmSpec>),
}

impl ResourceSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::VirtualNetwork { .. } => ResourceKind::VirtualNetwork,
            Self::Subnet { .. } => ResourceKind::Subnet,
            Self::SecurityGroup { .. } => ResourceKind::SecurityGroup,
            Self::PublicIp { .. } => ResourceKind::PublicIp,
            Self::NetworkInterface { .. } => ResourceKind::NetworkInterface,
            Self::VirtualMachine(_) => ResourceKind::VirtualMachine,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::VirtualNetwork { name, .. }
            | Self::Subnet { name, .. }
            | Self::SecurityGroup { name, .. }
            | Self::PublicIp { name, .. }
            | Self::NetworkInterface { name, .. } => name,
            Self::VirtualMachine(vm) => &vm.name,
        }
    }

    /// Reference used to delete the resource this spec creates
    pub fn target(&self) -> ResourceRef {
        match self {
            Self::Subnet {
                name,
                virtual_network,
                ..
            } => ResourceRef::child(ResourceKind::Subnet, name, virtual_network),
            other => ResourceRef::new(other.kind(), other.name()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_request() -> ProvisionRequest {
        ProvisionRequest {
            subscription_id: "00000000-0000-0000-0000-000000000000".into(),
            resource_group: "rg-mlops-dev".into(),
            location: "eastus".into(),
            vm_size: "Standard_B2s".into(),
            admin_username: "azureuser".into(),
            ssh_public_key: "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIExample user@host".into(),
            names: ResourceNames {
                virtual_network: "vnet-mlops".into(),
                subnet: "snet-mlops".into(),
                security_group: "nsg-mlops".into(),
                public_ip: "pip-mlops".into(),
                network_interface: "nic-mlops".into(),
                vm: "vm-mlops".into(),
            },
            image: ImageReference::default(),
            os_disk_type: DEFAULT_OS_DISK_TYPE.into(),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(sample_request().validate().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut req = sample_request();
        req.names.public_ip = String::new();
        let err = req.validate().unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Configuration {
                field: "vm.public_ip",
                ..
            }
        ));
    }

    #[test]
    fn test_name_rules() {
        assert!(check_name("f", "vm-01_a.b").is_ok());
        assert!(check_name("f", "-vm").is_err());
        assert!(check_name("f", "vm.").is_err());
        assert!(check_name("f", "vm name").is_err());
        assert!(check_name("f", &"a".repeat(81)).is_err());
    }

    #[test]
    fn test_ssh_key_shape() {
        let mut req = sample_request();
        req.ssh_public_key = "   ".into();
        assert!(req.validate().is_err());

        req.ssh_public_key = "not a key".into();
        assert!(req.validate().is_err());

        req.ssh_public_key = "ssh-rsa".into();
        assert!(req.validate().is_err());

        req.ssh_public_key = "ecdsa-sha2-nistp256 AAAAE2Vj".into();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_subnet_target_has_parent() {
        let spec = ResourceSpec::Subnet {
            name: "snet".into(),
            virtual_network: "vnet".into(),
            address_prefix: "10.0.0.0/24".into(),
        };
        assert_eq!(
            spec.target(),
            ResourceRef::child(ResourceKind::Subnet, "snet", "vnet")
        );
    }

    #[test]
    fn test_authorized_keys_path() {
        assert_eq!(
            sample_request().authorized_keys_path(),
            "/home/azureuser/.ssh/authorized_keys"
        );
    }
}
