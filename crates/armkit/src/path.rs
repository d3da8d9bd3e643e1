//! Resource Manager URL construction.

use provision::{ResourceKind, ResourceRef};

/// api-version for `Microsoft.Resources`
pub const RESOURCES_API_VERSION: &str = "2021-04-01";
/// api-version for `Microsoft.Network`
pub const NETWORK_API_VERSION: &str = "2023-09-01";
/// api-version for `Microsoft.Compute`
pub const COMPUTE_API_VERSION: &str = "2023-09-01";

/// Public cloud management endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Virtual machine actions exposed as POST endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmAction {
    PowerOff,
    Deallocate,
}

impl VmAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PowerOff => "powerOff",
            Self::Deallocate => "deallocate",
        }
    }
}

/// Builds resource ids and request URLs for one subscription
#[derive(Debug, Clone)]
pub struct ArmPaths {
    endpoint: String,
    subscription_id: String,
}

impl ArmPaths {
    pub fn new(endpoint: impl Into<String>, subscription_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            subscription_id: subscription_id.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `/subscriptions/{sub}/resourceGroups/{rg}`
    pub fn resource_group_id(&self, resource_group: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{resource_group}",
            self.subscription_id
        )
    }

    /// Full resource id of a resource inside a group
    pub fn resource_id(&self, resource_group: &str, target: &ResourceRef) -> String {
        let group = self.resource_group_id(resource_group);
        let name = &target.name;
        match target.kind {
            ResourceKind::ResourceGroup => group,
            ResourceKind::Subnet => {
                let vnet = target.parent.as_deref().unwrap_or_default();
                format!(
                    "{group}/providers/Microsoft.Network/virtualNetworks/{vnet}/subnets/{name}"
                )
            }
            kind => format!("{group}/providers/{}/{name}", provider_type(kind)),
        }
    }

    pub fn resource_group_url(&self, resource_group: &str) -> String {
        self.url(&self.resource_group_id(resource_group), RESOURCES_API_VERSION)
    }

    pub fn resource_url(&self, resource_group: &str, target: &ResourceRef) -> String {
        self.url(
            &self.resource_id(resource_group, target),
            api_version(target.kind),
        )
    }

    pub fn vm_action_url(&self, resource_group: &str, vm: &str, action: VmAction) -> String {
        let id = self.resource_id(
            resource_group,
            &ResourceRef::new(ResourceKind::VirtualMachine, vm),
        );
        self.url(&format!("{id}/{}", action.as_str()), COMPUTE_API_VERSION)
    }

    fn url(&self, id: &str, api_version: &str) -> String {
        format!("{}{id}?api-version={api_version}", self.endpoint)
    }
}

/// `{namespace}/{type}` segment for a top-level resource kind
fn provider_type(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::VirtualNetwork | ResourceKind::Subnet => {
            "Microsoft.Network/virtualNetworks"
        }
        ResourceKind::SecurityGroup => "Microsoft.Network/networkSecurityGroups",
        ResourceKind::PublicIp => "Microsoft.Network/publicIPAddresses",
        ResourceKind::NetworkInterface => "Microsoft.Network/networkInterfaces",
        ResourceKind::VirtualMachine => "Microsoft.Compute/virtualMachines",
        ResourceKind::ResourceGroup => "Microsoft.Resources/resourceGroups",
    }
}

fn api_version(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::ResourceGroup => RESOURCES_API_VERSION,
        ResourceKind::VirtualMachine => COMPUTE_API_VERSION,
        _ => NETWORK_API_VERSION,
    }
}
